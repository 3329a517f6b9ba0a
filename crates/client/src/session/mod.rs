//! Session bootstrap: dual-identity resolution.
//!
//! On application start the admin and customer credential scopes are
//! inspected, in that order, and exactly one identity (or none) is
//! resolved. Inconsistent records - a token without its snapshot, an
//! orphaned snapshot, an expired token - are purged on the spot.
//!
//! The admin scope is checked strictly first: if both scopes somehow
//! hold valid credentials, admin wins. The scopes are kept separate
//! precisely so an admin session cannot be silently overridden by a
//! concurrent customer login in the same profile.
//!
//! No branch performs a network call, and no branch returns an error:
//! every failure degrades to "no identity", which the rest of the
//! system treats as "please authenticate".

mod token;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tracing::{debug, instrument, warn};

use giftsouq_core::Identity;

use crate::storage::{CredentialStore, KeyValueStore, StorageError};

/// Outcome of the one-shot session bootstrap.
#[derive(Debug, Default)]
pub struct ResolvedSession {
    /// The single active identity, if any.
    pub identity: Option<Identity>,
    /// Bearer token from the resolved identity's scope.
    pub token: Option<SecretString>,
}

impl ResolvedSession {
    /// Whether an identity was resolved.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    fn none() -> Self {
        Self::default()
    }

    fn authenticated(identity: Identity, token: String) -> Self {
        Self {
            identity: Some(identity),
            token: Some(SecretString::from(token)),
        }
    }
}

/// Resolve the active identity from the two credential scopes.
///
/// Runs once per application start; not re-entrant and never retried.
/// Storage purges are the only side effects.
pub fn resolve<A, C>(
    admin: &CredentialStore<A>,
    customer: &CredentialStore<C>,
) -> ResolvedSession
where
    A: KeyValueStore,
    C: KeyValueStore,
{
    resolve_at(admin, customer, Utc::now())
}

/// Same as [`resolve`], with an explicit clock for expiry checks.
#[instrument(skip_all)]
pub fn resolve_at<A, C>(
    admin: &CredentialStore<A>,
    customer: &CredentialStore<C>,
    now: DateTime<Utc>,
) -> ResolvedSession
where
    A: KeyValueStore,
    C: KeyValueStore,
{
    // Admin scope first; precedence is an invariant, not an accident.
    if let Some(admin_token) = admin.token() {
        if token::is_live(&admin_token, now) {
            if let Some(identity) = admin.identity() {
                debug!("resolved admin session");
                return ResolvedSession::authenticated(identity, admin_token);
            }
            warn!("admin token without identity snapshot, purging scope");
        } else {
            debug!("admin token expired, purging scope");
        }
        purge_quietly(admin);
    }

    match (customer.token(), customer.identity()) {
        (Some(customer_token), Some(identity)) => {
            debug!("resolved customer session");
            ResolvedSession::authenticated(identity, customer_token)
        }
        (None, None) => ResolvedSession::none(),
        _ => {
            // Half a record - orphaned snapshot or snapshotless token.
            warn!("inconsistent customer credential record, purging scope");
            purge_quietly(customer);
            ResolvedSession::none()
        }
    }
}

/// Record a successful login in `scope`.
///
/// # Errors
///
/// Returns an error if the credential record cannot be written.
pub fn login<S: KeyValueStore>(
    scope: &CredentialStore<S>,
    token: &str,
    identity: &Identity,
) -> Result<(), StorageError> {
    scope.store_credentials(token, identity)
}

/// Clear the credentials for one scope at logout.
///
/// The guest cart key is untouched; cart state after logout is the
/// cart engine's concern.
///
/// # Errors
///
/// Returns an error if the credential record cannot be removed.
pub fn logout<S: KeyValueStore>(scope: &CredentialStore<S>) -> Result<(), StorageError> {
    scope.purge()
}

fn purge_quietly<S: KeyValueStore>(scope: &CredentialStore<S>) {
    if let Err(e) = scope.purge() {
        warn!(scope = scope.scope().as_str(), error = %e, "failed to purge credential scope");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::TimeDelta;

    use giftsouq_core::{Email, IdentityKind, UserId};

    use crate::storage::MemoryStore;

    use super::*;

    fn make_identity(kind: IdentityKind) -> Identity {
        Identity {
            id: UserId::new(1),
            name: "Test User".to_string(),
            email: Email::parse("user@example.com").unwrap(),
            phone: None,
            kind,
        }
    }

    fn make_token(exp: DateTime<Utc>) -> String {
        let payload = URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{}}}", exp.timestamp()));
        format!("eyJhbGciOiJIUzI1NiJ9.{payload}.sig")
    }

    fn scopes() -> (
        CredentialStore<MemoryStore>,
        CredentialStore<MemoryStore>,
        MemoryStore,
        MemoryStore,
    ) {
        let admin_backing = MemoryStore::new();
        let customer_backing = MemoryStore::new();
        let admin = CredentialStore::new(admin_backing.clone(), IdentityKind::Admin);
        let customer = CredentialStore::new(customer_backing.clone(), IdentityKind::Customer);
        (admin, customer, admin_backing, customer_backing)
    }

    #[test]
    fn test_admin_wins_when_both_scopes_valid() {
        let (admin, customer, _, _) = scopes();
        let now = Utc::now();

        admin
            .store_credentials(
                &make_token(now + TimeDelta::hours(1)),
                &make_identity(IdentityKind::Admin),
            )
            .unwrap();
        customer
            .store_credentials(
                &make_token(now + TimeDelta::hours(1)),
                &make_identity(IdentityKind::Customer),
            )
            .unwrap();

        let resolved = resolve_at(&admin, &customer, now);
        assert_eq!(
            resolved.identity.unwrap().kind,
            IdentityKind::Admin,
            "admin precedence must hold under dual login"
        );
        // A customer login must not evict the admin scope.
        assert!(customer.token().is_some());
    }

    #[test]
    fn test_admin_token_without_snapshot_purges_scope() {
        let (admin, customer, admin_backing, _) = scopes();
        let now = Utc::now();

        admin
            .store_credentials(
                &make_token(now + TimeDelta::hours(1)),
                &make_identity(IdentityKind::Admin),
            )
            .unwrap();
        admin_backing
            .remove(crate::storage::IDENTITY_KEY)
            .unwrap();

        let resolved = resolve_at(&admin, &customer, now);
        assert!(resolved.identity.is_none());
        assert_eq!(admin.token(), None, "admin scope must be empty after heal");
    }

    #[test]
    fn test_expired_admin_falls_through_to_customer() {
        let (admin, customer, _, _) = scopes();
        let now = Utc::now();

        admin
            .store_credentials(
                &make_token(now - TimeDelta::hours(1)),
                &make_identity(IdentityKind::Admin),
            )
            .unwrap();
        customer
            .store_credentials(
                &make_token(now + TimeDelta::hours(1)),
                &make_identity(IdentityKind::Customer),
            )
            .unwrap();

        let resolved = resolve_at(&admin, &customer, now);
        assert_eq!(resolved.identity.unwrap().kind, IdentityKind::Customer);
        assert_eq!(admin.token(), None, "expired admin record must be purged");
        assert!(resolved.token.is_some());
    }

    #[test]
    fn test_orphaned_customer_snapshot_is_purged() {
        let (admin, customer, _, customer_backing) = scopes();

        let snapshot =
            serde_json::to_string(&make_identity(IdentityKind::Customer)).unwrap();
        customer_backing
            .set(crate::storage::IDENTITY_KEY, &snapshot)
            .unwrap();

        let resolved = resolve_at(&admin, &customer, Utc::now());
        assert!(resolved.identity.is_none());
        assert_eq!(
            customer_backing
                .get(crate::storage::IDENTITY_KEY)
                .unwrap(),
            None,
            "orphaned snapshot must be removed"
        );
    }

    #[test]
    fn test_snapshotless_customer_token_is_purged() {
        let (admin, customer, _, customer_backing) = scopes();

        customer_backing
            .set(
                crate::storage::TOKEN_KEY,
                &make_token(Utc::now() + TimeDelta::hours(1)),
            )
            .unwrap();

        let resolved = resolve_at(&admin, &customer, Utc::now());
        assert!(resolved.identity.is_none());
        assert_eq!(customer.token(), None);
    }

    #[test]
    fn test_empty_scopes_resolve_none() {
        let (admin, customer, _, _) = scopes();
        let resolved = resolve_at(&admin, &customer, Utc::now());
        assert!(!resolved.is_authenticated());
        assert!(resolved.token.is_none());
    }

    #[test]
    fn test_login_then_logout_roundtrip() {
        let (_, customer, _, _) = scopes();
        let now = Utc::now();

        login(
            &customer,
            &make_token(now + TimeDelta::hours(1)),
            &make_identity(IdentityKind::Customer),
        )
        .unwrap();
        assert!(customer.token().is_some());

        logout(&customer).unwrap();
        assert_eq!(customer.token(), None);
        assert_eq!(customer.identity(), None);
    }
}
