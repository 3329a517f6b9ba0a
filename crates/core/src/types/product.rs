//! Product kinds.

use serde::{Deserialize, Serialize};

/// What a product line delivers.
///
/// Service products carry optional account-provisioning details on
/// their cart lines; gift cards do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductKind {
    /// A stored-value card delivered as a redemption code.
    GiftCard,
    /// A subscription or account-backed service.
    Service,
}

impl ProductKind {
    /// Whether this kind requires account-provisioning details.
    #[must_use]
    pub const fn is_service(self) -> bool {
        matches!(self, Self::Service)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_tags() {
        assert_eq!(
            serde_json::to_string(&ProductKind::GiftCard).unwrap(),
            "\"giftCard\""
        );
        assert_eq!(
            serde_json::to_string(&ProductKind::Service).unwrap(),
            "\"service\""
        );
    }

    #[test]
    fn test_is_service() {
        assert!(ProductKind::Service.is_service());
        assert!(!ProductKind::GiftCard.is_service());
    }
}
