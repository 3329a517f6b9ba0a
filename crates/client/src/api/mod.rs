//! Remote cart API contract and REST client.
//!
//! The server cart is owned and mutated exclusively by the backend;
//! this module only consumes its REST contract. Every response follows
//! the `{ success, data, message? }` envelope with a bilingual
//! (en/ar) message on rejection.
//!
//! The [`CartApi`] trait is the seam between the cart engine and the
//! transport: production uses [`RestCartApi`], tests drive the engine
//! with a scripted double.

mod rest;
pub mod types;

pub use rest::RestCartApi;
pub use types::{ApiEnvelope, BilingualMessage, ProductRef, ServerCart, ServerCartItem, VariationRef};

use thiserror::Error;

use giftsouq_core::{CartItemId, VariationId};

/// Errors from remote cart operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response without a structured message.
    #[error("HTTP error, status {0}")]
    Status(u16),

    /// Structured API rejection (`success: false`); the message is
    /// already language-resolved, English preferred.
    #[error("{0}")]
    Rejected(String),

    /// Response body could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Successful envelope with no cart payload.
    #[error("response contained no cart data")]
    MissingData,
}

/// Remote cart operations for one authenticated identity.
///
/// Every call carries the bearer token of the identity the
/// implementation was constructed for, and every mutation returns the
/// updated cart as the backend sees it.
pub trait CartApi {
    /// Fetch the current server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    fn fetch_cart(&self) -> impl Future<Output = Result<ServerCart, ApiError>>;

    /// Add `quantity` of a variation to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected (e.g. a
    /// server-side stock or price check).
    fn add_item(
        &self,
        variation_id: VariationId,
        quantity: u32,
    ) -> impl Future<Output = Result<ServerCart, ApiError>>;

    /// Change the quantity of an existing cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    fn update_item(
        &self,
        item_id: CartItemId,
        quantity: u32,
    ) -> impl Future<Output = Result<ServerCart, ApiError>>;

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    fn remove_item(&self, item_id: CartItemId) -> impl Future<Output = Result<ServerCart, ApiError>>;

    /// Empty the cart; returns the emptied cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    fn clear_cart(&self) -> impl Future<Output = Result<ServerCart, ApiError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = ApiError::Status(502);
        assert_eq!(err.to_string(), "HTTP error, status 502");
    }

    #[test]
    fn test_rejected_error_display() {
        let err = ApiError::Rejected("Variation out of stock".to_string());
        assert_eq!(err.to_string(), "Variation out of stock");
    }

    #[test]
    fn test_missing_data_display() {
        assert_eq!(
            ApiError::MissingData.to_string(),
            "response contained no cart data"
        );
    }
}
