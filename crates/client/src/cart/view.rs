//! Mode-independent display projection of cart lines.

use rust_decimal::Decimal;
use uuid::Uuid;

use giftsouq_core::{CartItemId, ProductKind, VariationId};

use crate::api::ServerCartItem;

use super::line::LocalCartLine;

/// Reference to a cart line in whichever mode currently owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartLineRef {
    /// Guest-mode line, addressed by variation.
    Local(VariationId),
    /// Server-mode line, addressed by its server-assigned id.
    Server(CartItemId),
}

/// Cart line display data, identical in shape for both modes.
#[derive(Debug, Clone)]
pub struct CartDisplayItem {
    /// Stable per-line key for render identity.
    ///
    /// Server lines use their server id; local lines get a
    /// deterministic key derived from the variation id, so recomputing
    /// the projection never changes an item's identity.
    pub key: String,
    /// Handle for quantity updates and removal.
    pub line: CartLineRef,
    /// Product display name.
    pub product_name: String,
    /// Variation display name.
    pub variation_name: String,
    /// Product kind.
    pub kind: ProductKind,
    /// Line quantity.
    pub quantity: u32,
    /// Unit price.
    pub unit_price: Decimal,
    /// Quantity times unit price.
    pub line_total: Decimal,
    /// Product photo, if any.
    pub photo_url: Option<String>,
}

impl From<&LocalCartLine> for CartDisplayItem {
    fn from(line: &LocalCartLine) -> Self {
        Self {
            key: local_line_key(line.variation_id).to_string(),
            line: CartLineRef::Local(line.variation_id),
            product_name: line.product_name.clone(),
            variation_name: line.variation_name.clone(),
            kind: line.kind,
            quantity: line.quantity,
            unit_price: line.price,
            line_total: line.line_total(),
            photo_url: line.photo_url.clone(),
        }
    }
}

impl From<&ServerCartItem> for CartDisplayItem {
    fn from(item: &ServerCartItem) -> Self {
        Self {
            key: item.id.to_string(),
            line: CartLineRef::Server(item.id),
            product_name: item.product.name.clone(),
            variation_name: item.variation.name.clone(),
            kind: item.product.kind,
            quantity: item.quantity,
            unit_price: item.price,
            line_total: item.price * Decimal::from(item.quantity),
            photo_url: item.product.photo_url.clone(),
        }
    }
}

/// Generate a stable UUID key for a local line.
///
/// Local lines have no server id yet, so the key is derived
/// deterministically from the variation id.
fn local_line_key(variation_id: VariationId) -> Uuid {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    variation_id.hash(&mut hasher);
    let bytes = hasher.finish().to_le_bytes();

    let mut uuid_bytes = [0u8; 16];
    uuid_bytes[..8].copy_from_slice(&bytes);
    uuid_bytes[8..].copy_from_slice(&bytes);

    // Set version 4 and variant bits
    uuid_bytes[6] = (uuid_bytes[6] & 0x0f) | 0x40;
    uuid_bytes[8] = (uuid_bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(uuid_bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use giftsouq_core::ProductId;

    use crate::api::{ProductRef, VariationRef};
    use crate::cart::line::tests::gift_card_line;

    use super::*;

    #[test]
    fn test_local_key_is_stable_across_recomputation() {
        let line = gift_card_line(7, 2, "10.00");
        let first = CartDisplayItem::from(&line);
        let second = CartDisplayItem::from(&line);
        assert_eq!(first.key, second.key);
    }

    #[test]
    fn test_local_keys_differ_per_variation() {
        assert_ne!(
            local_line_key(VariationId::new(7)),
            local_line_key(VariationId::new(8))
        );
    }

    #[test]
    fn test_server_item_projection() {
        let item = ServerCartItem {
            id: CartItemId::new(101),
            variation_id: VariationId::new(7),
            quantity: 3,
            price: "10.00".parse().unwrap(),
            product: ProductRef {
                id: ProductId::new(4),
                name: "Game Points".to_string(),
                kind: ProductKind::GiftCard,
                photo_url: None,
            },
            variation: VariationRef {
                id: VariationId::new(7),
                name: "1000 points".to_string(),
            },
        };

        let view = CartDisplayItem::from(&item);
        assert_eq!(view.key, "101");
        assert_eq!(view.line, CartLineRef::Server(CartItemId::new(101)));
        assert_eq!(view.line_total, "30.00".parse().unwrap());
    }
}
