//! Credential records, one store per identity scope.

use tracing::warn;

use giftsouq_core::{Identity, IdentityKind};

use super::{KeyValueStore, StorageError};

/// Storage key for the bearer token within a credential scope.
pub const TOKEN_KEY: &str = "auth_token";

/// Storage key for the identity snapshot within a credential scope.
pub const IDENTITY_KEY: &str = "identity";

/// One credential scope: a (token, identity snapshot) pair.
///
/// The admin and customer scopes are separate `CredentialStore`
/// instances over separate backing stores, so one can be
/// session-lifetime and the other persistent, and neither can clobber
/// the other's keys.
///
/// Reads degrade: a storage failure or a corrupt snapshot is logged
/// and reported as absent, because the session bootstrap treats every
/// local precondition failure as "not authenticated" rather than an
/// error.
#[derive(Debug, Clone)]
pub struct CredentialStore<S> {
    store: S,
    scope: IdentityKind,
}

impl<S: KeyValueStore> CredentialStore<S> {
    /// Wrap `store` as the credential scope for `scope`.
    pub const fn new(store: S, scope: IdentityKind) -> Self {
        Self { store, scope }
    }

    /// Which identity kind this scope holds credentials for.
    #[must_use]
    pub const fn scope(&self) -> IdentityKind {
        self.scope
    }

    /// Read the bearer token, if present.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!(scope = self.scope.as_str(), error = %e, "failed to read token");
                None
            }
        }
    }

    /// Read the identity snapshot, if present and parseable.
    ///
    /// A corrupt snapshot reads as absent; the bootstrap's purge logic
    /// then removes the whole record.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        let raw = match self.store.get(IDENTITY_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(scope = self.scope.as_str(), error = %e, "failed to read identity snapshot");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!(scope = self.scope.as_str(), error = %e, "corrupt identity snapshot");
                None
            }
        }
    }

    /// Store a complete credential record: token and snapshot together.
    ///
    /// # Errors
    ///
    /// Returns an error if either half cannot be written; on a partial
    /// write the next bootstrap purges the remainder.
    pub fn store_credentials(&self, token: &str, identity: &Identity) -> Result<(), StorageError> {
        let snapshot = serde_json::to_string(identity)?;
        self.store.set(TOKEN_KEY, token)?;
        self.store.set(IDENTITY_KEY, &snapshot)
    }

    /// Remove both halves of the credential record together.
    ///
    /// Both removals are attempted even if the first fails, so a
    /// failure can never strand a token without its snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first removal error, if any.
    pub fn purge(&self) -> Result<(), StorageError> {
        let token = self.store.remove(TOKEN_KEY);
        let identity = self.store.remove(IDENTITY_KEY);
        token.and(identity)
    }
}
