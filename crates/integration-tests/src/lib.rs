//! Shared harness for the Giftsouq client integration tests.
//!
//! The backend is replaced by [`ScriptedCartApi`], an in-memory cart
//! service that mirrors the wire contract: it dedups adds by
//! variation, computes authoritative totals, and can be scripted to
//! reject specific variations the way the real backend does for
//! out-of-stock lines. Clones share state, so a test can keep a
//! handle for assertions after handing the API to the cart engine.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use giftsouq_client::api::{
    ApiError, CartApi, ProductRef, ServerCart, ServerCartItem, VariationRef,
};
use giftsouq_client::cart::LocalCartLine;
use giftsouq_core::{
    CartId, CartItemId, Email, Identity, IdentityKind, ProductId, ProductKind, UserId, VariationId,
};

/// Initialize test logging once per process.
///
/// Honors `RUST_LOG`; repeated calls are no-ops so every test can call
/// it unconditionally.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Fixtures
// =============================================================================

/// A bearer token whose `exp` claim lies `expires_in_secs` from now.
/// Unsigned; only the payload segment matters to the client.
#[must_use]
pub fn make_token(expires_in_secs: i64) -> String {
    let exp = (Utc::now() + Duration::seconds(expires_in_secs)).timestamp();
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "HS256", "typ": "JWT"}).to_string());
    let payload = URL_SAFE_NO_PAD.encode(json!({"sub": 1, "exp": exp}).to_string());
    format!("{header}.{payload}.sig")
}

/// An identity snapshot for `kind`, with a deterministic email.
#[must_use]
pub fn identity(id: i64, kind: IdentityKind) -> Identity {
    let email = format!("{}{id}@example.com", kind.as_str());
    Identity {
        id: UserId::new(id),
        name: format!("Test {}", kind.as_str()),
        email: Email::parse(&email).expect("fixture email is valid"),
        phone: None,
        kind,
    }
}

/// A guest cart line for a gift card variation.
#[must_use]
pub fn gift_card_line(variation_id: i64, quantity: u32, price: &str) -> LocalCartLine {
    LocalCartLine {
        variation_id: VariationId::new(variation_id),
        quantity,
        product_name: "Game Points".to_string(),
        variation_name: format!("Variation {variation_id}"),
        kind: ProductKind::GiftCard,
        price: price.parse().expect("fixture price is a valid decimal"),
        photo_url: None,
        provisioning: None,
    }
}

// =============================================================================
// Scripted backend
// =============================================================================

/// Catalog entry backing one sellable variation.
pub struct CatalogEntry {
    pub product_id: i64,
    pub product_name: String,
    pub variation_name: String,
    pub kind: ProductKind,
    pub price: Decimal,
}

struct StoredItem {
    item_id: i64,
    variation_id: i64,
    quantity: u32,
}

#[derive(Default)]
struct ScriptedState {
    catalog: HashMap<i64, CatalogEntry>,
    items: Vec<StoredItem>,
    rejected: HashSet<i64>,
    offline: bool,
    next_item_id: i64,
    calls: Vec<String>,
}

/// In-memory cart backend with scriptable rejections.
#[derive(Clone, Default)]
pub struct ScriptedCartApi {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedCartApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a gift card variation in the catalog.
    pub fn stock_gift_card(&self, variation_id: i64, price: &str) {
        self.stock(
            variation_id,
            CatalogEntry {
                product_id: variation_id * 10,
                product_name: "Game Points".to_string(),
                variation_name: format!("Variation {variation_id}"),
                kind: ProductKind::GiftCard,
                price: price.parse().expect("fixture price is a valid decimal"),
            },
        );
    }

    /// Put a service variation in the catalog.
    pub fn stock_service(&self, variation_id: i64, price: &str) {
        self.stock(
            variation_id,
            CatalogEntry {
                product_id: variation_id * 10,
                product_name: "Streaming Account".to_string(),
                variation_name: format!("Plan {variation_id}"),
                kind: ProductKind::Service,
                price: price.parse().expect("fixture price is a valid decimal"),
            },
        );
    }

    pub fn stock(&self, variation_id: i64, entry: CatalogEntry) {
        self.lock().catalog.insert(variation_id, entry);
    }

    /// Script the backend to reject adds for one variation.
    pub fn reject_variation(&self, variation_id: i64) {
        self.lock().rejected.insert(variation_id);
    }

    /// Script the backend to fail every call with a gateway error, as
    /// if unreachable.
    pub fn set_offline(&self) {
        self.lock().offline = true;
    }

    /// Pre-populate the server cart, as if from an earlier session on
    /// another device. The variation must already be stocked.
    pub fn seed_item(&self, variation_id: i64, quantity: u32) {
        let mut state = self.lock();
        assert!(
            state.catalog.contains_key(&variation_id),
            "seed_item requires a stocked variation"
        );
        state.next_item_id += 1;
        let item_id = state.next_item_id;
        state.items.push(StoredItem {
            item_id,
            variation_id,
            quantity,
        });
    }

    /// Every API call made so far, in order, as `name:args` strings.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// The backend's current view of the cart.
    #[must_use]
    pub fn cart_snapshot(&self) -> ServerCart {
        assemble(&self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptedState> {
        self.state.lock().expect("scripted state lock poisoned")
    }
}

fn assemble(state: &ScriptedState) -> ServerCart {
    let items: Vec<ServerCartItem> = state
        .items
        .iter()
        .map(|item| {
            let entry = state
                .catalog
                .get(&item.variation_id)
                .expect("stored item references a stocked variation");
            ServerCartItem {
                id: CartItemId::new(item.item_id),
                variation_id: VariationId::new(item.variation_id),
                quantity: item.quantity,
                price: entry.price,
                product: ProductRef {
                    id: ProductId::new(entry.product_id),
                    name: entry.product_name.clone(),
                    kind: entry.kind,
                    photo_url: None,
                },
                variation: VariationRef {
                    id: VariationId::new(item.variation_id),
                    name: entry.variation_name.clone(),
                },
            }
        })
        .collect();

    let total_quantity = items.iter().map(|item| item.quantity).sum();
    let total_amount = items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum();

    ServerCart {
        id: CartId::new(1),
        items,
        total_quantity,
        total_amount,
    }
}

impl CartApi for ScriptedCartApi {
    async fn fetch_cart(&self) -> Result<ServerCart, ApiError> {
        let mut state = self.lock();
        state.calls.push("fetch".to_string());
        if state.offline {
            return Err(ApiError::Status(503));
        }
        Ok(assemble(&state))
    }

    async fn add_item(
        &self,
        variation_id: VariationId,
        quantity: u32,
    ) -> Result<ServerCart, ApiError> {
        let mut state = self.lock();
        let raw_id = variation_id.as_i64();
        state.calls.push(format!("add:{raw_id}:{quantity}"));

        if state.offline {
            return Err(ApiError::Status(503));
        }
        if state.rejected.contains(&raw_id) {
            return Err(ApiError::Rejected("Out of stock".to_string()));
        }
        if !state.catalog.contains_key(&raw_id) {
            return Err(ApiError::Rejected("Unknown variation".to_string()));
        }

        // The backend dedups by variation, summing quantities.
        if let Some(existing) = state.items.iter_mut().find(|i| i.variation_id == raw_id) {
            existing.quantity += quantity;
        } else {
            state.next_item_id += 1;
            let item_id = state.next_item_id;
            state.items.push(StoredItem {
                item_id,
                variation_id: raw_id,
                quantity,
            });
        }
        Ok(assemble(&state))
    }

    async fn update_item(
        &self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<ServerCart, ApiError> {
        let mut state = self.lock();
        state.calls.push(format!("update:{item_id}:{quantity}"));

        if state.offline {
            return Err(ApiError::Status(503));
        }
        let raw_id = item_id.as_i64();
        match state.items.iter_mut().find(|i| i.item_id == raw_id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(assemble(&state))
            }
            None => Err(ApiError::Rejected("Cart item not found".to_string())),
        }
    }

    async fn remove_item(&self, item_id: CartItemId) -> Result<ServerCart, ApiError> {
        let mut state = self.lock();
        state.calls.push(format!("remove:{item_id}"));

        if state.offline {
            return Err(ApiError::Status(503));
        }
        let raw_id = item_id.as_i64();
        let before = state.items.len();
        state.items.retain(|i| i.item_id != raw_id);
        if state.items.len() == before {
            return Err(ApiError::Rejected("Cart item not found".to_string()));
        }
        Ok(assemble(&state))
    }

    async fn clear_cart(&self) -> Result<ServerCart, ApiError> {
        let mut state = self.lock();
        state.calls.push("clear".to_string());
        if state.offline {
            return Err(ApiError::Status(503));
        }
        state.items.clear();
        Ok(assemble(&state))
    }
}
