//! Wire types for the cart REST API.
//!
//! Field names are camelCase on the wire; decimal amounts travel as
//! strings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use giftsouq_core::{CartId, CartItemId, ProductId, ProductKind, VariationId};

/// Standard response envelope: `{ success, data, message? }`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    /// Whether the operation was accepted.
    pub success: bool,
    /// Payload on success; may be absent on rejection.
    pub data: Option<T>,
    /// Human-readable message, usually present on rejection.
    #[serde(default)]
    pub message: Option<BilingualMessage>,
}

/// API message in both storefront languages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BilingualMessage {
    /// English text.
    #[serde(default)]
    pub en: Option<String>,
    /// Arabic text.
    #[serde(default)]
    pub ar: Option<String>,
}

impl BilingualMessage {
    /// Display text, preferring English.
    #[must_use]
    pub fn display(&self) -> Option<&str> {
        self.en.as_deref().or(self.ar.as_deref())
    }
}

/// Authoritative server-side cart for the authenticated identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCart {
    /// Backend cart ID.
    pub id: CartId,
    /// Cart lines.
    #[serde(default)]
    pub items: Vec<ServerCartItem>,
    /// Total quantity across all lines.
    #[serde(default)]
    pub total_quantity: u32,
    /// Amount due, after any server-side adjustments.
    #[serde(default)]
    pub total_amount: Decimal,
}

/// One server cart line; mutated only through the remote API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCartItem {
    /// Server-assigned line ID.
    pub id: CartItemId,
    /// The selected variation.
    pub variation_id: VariationId,
    /// Line quantity.
    pub quantity: u32,
    /// Unit price as the backend currently prices it.
    pub price: Decimal,
    /// Product reference for display.
    pub product: ProductRef,
    /// Variation reference for display.
    pub variation: VariationRef,
}

/// Denormalized product reference on a server cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    /// Product ID.
    pub id: ProductId,
    /// Product display name.
    pub name: String,
    /// Product kind.
    pub kind: ProductKind,
    /// Product photo, if any.
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Denormalized variation reference on a server cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationRef {
    /// Variation ID.
    pub id: VariationId,
    /// Variation display name.
    pub name: String,
}

/// Body of `POST /cart/items`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddItemRequest {
    pub variation_id: VariationId,
    pub quantity: u32,
}

/// Body of `PUT /cart/items/{itemId}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateItemRequest {
    pub quantity: u32,
}
