//! reqwest-backed cart API client.

use std::sync::Arc;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::instrument;

use giftsouq_core::{CartItemId, VariationId};

use crate::config::ClientConfig;

use super::types::{AddItemRequest, ApiEnvelope, ServerCart, UpdateItemRequest};
use super::{ApiError, CartApi};

/// REST client for the cart endpoints.
///
/// Cheaply cloneable. Constructed per resolved identity: every request
/// carries `Authorization: Bearer <token>` from the scope that
/// identity was resolved from.
#[derive(Clone)]
pub struct RestCartApi {
    inner: Arc<RestCartApiInner>,
}

struct RestCartApiInner {
    client: reqwest::Client,
    base_url: String,
    token: SecretString,
}

impl RestCartApi {
    /// Create a client for one authenticated identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, token: SecretString) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(RestCartApiInner {
                client,
                base_url: config.api_url.clone(),
                token,
            }),
        })
    }

    async fn execute<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ServerCart, ApiError> {
        let url = format!("{}{path}", self.inner.base_url);

        let mut request = self
            .inner
            .client
            .request(method, &url)
            .bearer_auth(self.inner.token.expose_secret());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        // Body as text first, for error diagnostics
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %snippet(&text),
                "cart API returned non-success status"
            );
            if let Some(message) = rejection_message(&text) {
                return Err(ApiError::Rejected(message));
            }
            return Err(ApiError::Status(status.as_u16()));
        }

        let envelope: ApiEnvelope<ServerCart> = serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %snippet(&text),
                "failed to parse cart API response"
            );
            ApiError::Parse(e)
        })?;

        if !envelope.success {
            return Err(ApiError::Rejected(envelope.message.as_ref().map_or_else(
                || "cart operation rejected".to_string(),
                |message| {
                    message
                        .display()
                        .unwrap_or("cart operation rejected")
                        .to_string()
                },
            )));
        }

        envelope.data.ok_or(ApiError::MissingData)
    }
}

impl CartApi for RestCartApi {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<ServerCart, ApiError> {
        self.execute::<()>(Method::GET, "/cart", None).await
    }

    #[instrument(skip(self))]
    async fn add_item(
        &self,
        variation_id: VariationId,
        quantity: u32,
    ) -> Result<ServerCart, ApiError> {
        let body = AddItemRequest {
            variation_id,
            quantity,
        };
        self.execute(Method::POST, "/cart/items", Some(&body)).await
    }

    #[instrument(skip(self))]
    async fn update_item(&self, item_id: CartItemId, quantity: u32) -> Result<ServerCart, ApiError> {
        let body = UpdateItemRequest { quantity };
        self.execute(Method::PUT, &format!("/cart/items/{item_id}"), Some(&body))
            .await
    }

    #[instrument(skip(self))]
    async fn remove_item(&self, item_id: CartItemId) -> Result<ServerCart, ApiError> {
        self.execute::<()>(Method::DELETE, &format!("/cart/items/{item_id}"), None)
            .await
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<ServerCart, ApiError> {
        self.execute::<()>(Method::DELETE, "/cart", None).await
    }
}

/// Extract a display message from a rejection body, if it parses.
fn rejection_message(text: &str) -> Option<String> {
    let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_str(text).ok()?;
    envelope
        .message
        .as_ref()
        .and_then(super::BilingualMessage::display)
        .map(ToString::to_string)
}

fn snippet(text: &str) -> String {
    text.chars().take(500).collect()
}
