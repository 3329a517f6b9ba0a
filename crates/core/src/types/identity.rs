//! Resolved user identity.
//!
//! An [`Identity`] is the currently-active user context. Admin and
//! customer credentials live in disjoint storage scopes; at most one
//! identity is ever active at a time, and the session bootstrap is the
//! only place that decides which.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;

/// Which kind of user an identity (or a credential scope) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    /// Dashboard operator; credentials are session-scoped.
    Admin,
    /// Storefront shopper; credentials persist across restarts.
    Customer,
}

impl IdentityKind {
    /// Stable name used in storage scope labels and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Customer => "customer",
        }
    }
}

/// The resolved, currently-active user context.
///
/// Persisted alongside the bearer token as the credential snapshot; a
/// token without a snapshot (or vice versa) is corrupt and gets purged
/// by the session bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Backend-assigned user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: Email,
    /// Contact phone, if provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Discriminant tag.
    pub kind: IdentityKind,
}

impl Identity {
    /// Whether this is an admin identity.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.kind, IdentityKind::Admin)
    }
}
