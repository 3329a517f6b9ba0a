//! Cart reconciliation engine.
//!
//! The cart lives in exactly one of two modes:
//!
//! - **Local** (guest): lines held in client persistence under a
//!   single storage key, upserted by variation id.
//! - **Server** (authenticated): the backend cart is authoritative and
//!   every mutation goes through the remote API.
//!
//! The transition happens exactly once per session, when an
//! authentication signal arrives: the guest lines are merged into the
//! server cart line by line, best-effort, and local state is then
//! dropped unconditionally. Duplicate authentication signals are
//! ignored; the phase enum is the re-entrancy guard.
//!
//! All read accessors branch on the current mode and never touch the
//! other representation, even if it is transiently populated.

mod line;
mod merge;
mod view;

pub use line::{AccountProvisioning, LocalCartLine, ProvisioningMode};
pub use merge::{MergeOutcome, MergeReport};
pub use view::{CartDisplayItem, CartLineRef};

use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::api::{ApiError, CartApi, ServerCart};
use crate::storage::KeyValueStore;

/// Storage key holding the guest cart snapshot (a JSON array of
/// lines). Owned exclusively by the cart engine.
pub const GUEST_CART_KEY: &str = "guest_cart";

/// Which representation currently backs the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartMode {
    /// Guest lines in client persistence.
    Local,
    /// Backend cart, reached through the remote API.
    Server,
}

/// Lifecycle phase of the engine.
///
/// `Authenticating` and `Merging` are transient; `Merging` doubles as
/// the single loading flag spanning the whole multi-step merge. The
/// engine never moves backwards except through an explicit logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartPhase {
    /// Unauthenticated; cart is local.
    Guest,
    /// Authentication signal received, merge not yet started.
    Authenticating,
    /// Merge in flight.
    Merging,
    /// Merge finished; cart is server-backed.
    Authenticated,
}

/// Client-side cart state machine.
///
/// Generic over the remote API and the storage backend so both seams
/// take test doubles. Remote failures are recorded as a transient
/// display message rather than propagated; one failed operation never
/// poisons the next.
pub struct CartEngine<A, S> {
    api: Option<A>,
    store: S,
    phase: CartPhase,
    local_lines: Vec<LocalCartLine>,
    server_cart: Option<ServerCart>,
    last_error: Option<String>,
}

impl<A: CartApi, S: KeyValueStore> CartEngine<A, S> {
    /// Create an engine in guest mode, loading any persisted guest
    /// cart. A missing, unreadable, or corrupt snapshot starts empty.
    pub fn new(store: S) -> Self {
        let local_lines = match store.get(GUEST_CART_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "corrupt guest cart snapshot, starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read guest cart snapshot");
                Vec::new()
            }
        };

        Self {
            api: None,
            store,
            phase: CartPhase::Guest,
            local_lines,
            server_cart: None,
            last_error: None,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> CartPhase {
        self.phase
    }

    /// Current cart mode. The cart stays local until the merge has
    /// fully completed.
    #[must_use]
    pub const fn mode(&self) -> CartMode {
        match self.phase {
            CartPhase::Authenticated => CartMode::Server,
            _ => CartMode::Local,
        }
    }

    /// Whether the merge sequence is in flight.
    #[must_use]
    pub const fn is_merging(&self) -> bool {
        matches!(self.phase, CartPhase::Merging)
    }

    /// Most recent remote failure message, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Take and clear the most recent failure message.
    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add an item in whichever mode is active.
    ///
    /// Guest mode upserts by variation id (quantity sums, display
    /// metadata is replaced); server mode delegates to the remote API,
    /// which owns its own dedup behavior.
    #[instrument(skip(self, item), fields(variation_id = %item.variation_id, quantity = item.quantity))]
    pub async fn add_item(&mut self, item: LocalCartLine) {
        match self.mode() {
            CartMode::Local => {
                line::upsert(&mut self.local_lines, item);
                self.persist_local();
            }
            CartMode::Server => {
                let result = match self.api.as_ref() {
                    Some(api) => api.add_item(item.variation_id, item.quantity).await,
                    None => return,
                };
                self.apply_remote("add item", result);
            }
        }
    }

    /// Set a line's quantity. Zero removes the line, in both modes
    /// identically.
    #[instrument(skip(self))]
    pub async fn set_quantity(&mut self, line: CartLineRef, quantity: u32) {
        if quantity == 0 {
            self.remove_item(line).await;
            return;
        }

        match (self.mode(), line) {
            (CartMode::Local, CartLineRef::Local(variation_id)) => {
                if let Some(existing) = self
                    .local_lines
                    .iter_mut()
                    .find(|l| l.variation_id == variation_id)
                {
                    existing.quantity = quantity;
                    self.persist_local();
                }
            }
            (CartMode::Server, CartLineRef::Server(item_id)) => {
                let result = match self.api.as_ref() {
                    Some(api) => api.update_item(item_id, quantity).await,
                    None => return,
                };
                self.apply_remote("update quantity", result);
            }
            _ => warn!("cart line reference does not match the active cart mode"),
        }
    }

    /// Remove a line from the cart.
    #[instrument(skip(self))]
    pub async fn remove_item(&mut self, line: CartLineRef) {
        match (self.mode(), line) {
            (CartMode::Local, CartLineRef::Local(variation_id)) => {
                self.local_lines.retain(|l| l.variation_id != variation_id);
                self.persist_local();
            }
            (CartMode::Server, CartLineRef::Server(item_id)) => {
                let result = match self.api.as_ref() {
                    Some(api) => api.remove_item(item_id).await,
                    None => return,
                };
                self.apply_remote("remove item", result);
            }
            _ => warn!("cart line reference does not match the active cart mode"),
        }
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) {
        match self.mode() {
            CartMode::Local => {
                self.local_lines.clear();
                if let Err(e) = self.store.remove(GUEST_CART_KEY) {
                    warn!(error = %e, "failed to clear guest cart snapshot");
                }
            }
            CartMode::Server => {
                let result = match self.api.as_ref() {
                    Some(api) => api.clear_cart().await,
                    None => return,
                };
                self.apply_remote("clear cart", result);
            }
        }
    }

    /// Re-fetch the server cart. No-op in guest mode.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) {
        if self.mode() == CartMode::Server {
            let result = match self.api.as_ref() {
                Some(api) => api.fetch_cart().await,
                None => return,
            };
            self.apply_remote("fetch cart", result);
        }
    }

    // =========================================================================
    // Authentication transitions
    // =========================================================================

    /// Handle a newly authenticated identity: install the API handle
    /// for that identity and merge the guest cart into its server
    /// cart.
    ///
    /// Triggered exactly once per authentication event - duplicate
    /// signals return `None` without side effects. The merge itself
    /// never fails; per-line outcomes land in the returned report and
    /// the engine always reaches `Authenticated`.
    #[instrument(skip(self, api))]
    pub async fn on_authenticated(&mut self, api: A) -> Option<MergeReport> {
        if self.phase != CartPhase::Guest {
            debug!(phase = ?self.phase, "duplicate authentication signal ignored");
            return None;
        }

        self.phase = CartPhase::Authenticating;
        self.api = Some(api);

        self.phase = CartPhase::Merging;
        let report = self.merge_local_lines().await;
        self.phase = CartPhase::Authenticated;

        debug!(
            added = report.added(),
            failed = report.failed(),
            "guest cart merge complete"
        );
        Some(report)
    }

    /// Revert to an empty guest cart at logout.
    ///
    /// Server cart state is never copied back down into local storage.
    pub fn on_logout(&mut self) {
        self.phase = CartPhase::Guest;
        self.api = None;
        self.server_cart = None;
        self.local_lines.clear();
        self.last_error = None;
    }

    async fn merge_local_lines(&mut self) -> MergeReport {
        let mut report = MergeReport::default();
        let Some(api) = self.api.as_ref() else {
            return report;
        };

        // Baseline fetch; local lines stay untouched until every add
        // has been attempted.
        match api.fetch_cart().await {
            Ok(cart) => self.server_cart = Some(cart),
            Err(e) => {
                warn!(error = %e, "failed to fetch baseline server cart");
                report.baseline_error = Some(e.to_string());
            }
        }

        // Sequential, best-effort, no rollback: the backend may
        // legitimately reject one line of a mixed cart (stock, price)
        // while the rest succeed. A failed line is dropped, not
        // re-queued.
        for local_line in &self.local_lines {
            match api.add_item(local_line.variation_id, local_line.quantity).await {
                Ok(cart) => {
                    self.server_cart = Some(cart);
                    report.outcomes.push(MergeOutcome::Added(local_line.variation_id));
                }
                Err(e) => {
                    warn!(
                        variation_id = %local_line.variation_id,
                        error = %e,
                        "merge skipped cart line"
                    );
                    report.outcomes.push(MergeOutcome::Failed {
                        variation_id: local_line.variation_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        // One refresh, to pick up server-side price and availability
        // adjustments the client is not authoritative over.
        match api.fetch_cart().await {
            Ok(cart) => self.server_cart = Some(cart),
            Err(e) => {
                warn!(error = %e, "failed to refresh server cart after merge");
                report.refresh_error = Some(e.to_string());
            }
        }

        // Local state is dropped unconditionally, whatever the
        // per-line outcomes.
        self.local_lines.clear();
        if let Err(e) = self.store.remove(GUEST_CART_KEY) {
            warn!(error = %e, "failed to clear guest cart snapshot");
        }

        report
    }

    // =========================================================================
    // Reads (dual-mode)
    // =========================================================================

    /// Total quantity across all lines in the active mode.
    #[must_use]
    pub fn total_item_count(&self) -> u32 {
        match self.mode() {
            CartMode::Local => self.local_lines.iter().map(|l| l.quantity).sum(),
            CartMode::Server => self
                .server_cart
                .as_ref()
                .map_or(0, |cart| cart.total_quantity),
        }
    }

    /// Total amount in the active mode.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        match self.mode() {
            CartMode::Local => self.local_lines.iter().map(LocalCartLine::line_total).sum(),
            CartMode::Server => self
                .server_cart
                .as_ref()
                .map_or(Decimal::ZERO, |cart| cart.total_amount),
        }
    }

    /// Whether the cart contains any service-kind items.
    #[must_use]
    pub fn has_service_items(&self) -> bool {
        match self.mode() {
            CartMode::Local => self.local_lines.iter().any(|l| l.kind.is_service()),
            CartMode::Server => self.server_cart.as_ref().is_some_and(|cart| {
                cart.items.iter().any(|item| item.product.kind.is_service())
            }),
        }
    }

    /// Display projection of the active mode's lines.
    #[must_use]
    pub fn display_items(&self) -> Vec<CartDisplayItem> {
        match self.mode() {
            CartMode::Local => self.local_lines.iter().map(CartDisplayItem::from).collect(),
            CartMode::Server => self.server_cart.as_ref().map_or_else(Vec::new, |cart| {
                cart.items.iter().map(CartDisplayItem::from).collect()
            }),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn apply_remote(&mut self, operation: &str, result: Result<ServerCart, ApiError>) {
        match result {
            Ok(cart) => {
                self.server_cart = Some(cart);
                self.last_error = None;
            }
            Err(e) => {
                warn!(operation, error = %e, "cart API operation failed");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn persist_local(&self) {
        match serde_json::to_string(&self.local_lines) {
            Ok(raw) => {
                if let Err(e) = self.store.set(GUEST_CART_KEY, &raw) {
                    warn!(error = %e, "failed to persist guest cart snapshot");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize guest cart snapshot"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use giftsouq_core::{CartId, CartItemId, ProductId, ProductKind, VariationId};

    use crate::api::{ProductRef, ServerCartItem, VariationRef};
    use crate::storage::MemoryStore;

    use super::line::tests::gift_card_line;
    use super::*;

    /// API double for tests that never reach the server.
    struct NoApi;

    impl CartApi for NoApi {
        async fn fetch_cart(&self) -> Result<ServerCart, ApiError> {
            Err(ApiError::MissingData)
        }

        async fn add_item(&self, _: VariationId, _: u32) -> Result<ServerCart, ApiError> {
            Err(ApiError::MissingData)
        }

        async fn update_item(&self, _: CartItemId, _: u32) -> Result<ServerCart, ApiError> {
            Err(ApiError::MissingData)
        }

        async fn remove_item(&self, _: CartItemId) -> Result<ServerCart, ApiError> {
            Err(ApiError::MissingData)
        }

        async fn clear_cart(&self) -> Result<ServerCart, ApiError> {
            Err(ApiError::MissingData)
        }
    }

    fn guest_engine() -> CartEngine<NoApi, MemoryStore> {
        CartEngine::new(MemoryStore::new())
    }

    fn server_cart_fixture() -> ServerCart {
        ServerCart {
            id: CartId::new(31),
            items: vec![ServerCartItem {
                id: CartItemId::new(101),
                variation_id: VariationId::new(7),
                quantity: 2,
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
            }],
            total_quantity: 2,
            total_amount: "20.00".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_guest_add_upserts_by_variation() {
        let mut engine = guest_engine();
        engine.add_item(gift_card_line(7, 2, "10.00")).await;
        engine.add_item(gift_card_line(7, 3, "10.00")).await;

        assert_eq!(engine.display_items().len(), 1);
        assert_eq!(engine.total_item_count(), 5);
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_line() {
        let mut engine = guest_engine();
        engine.add_item(gift_card_line(7, 2, "10.00")).await;
        engine.add_item(gift_card_line(8, 1, "25.00")).await;

        engine
            .set_quantity(CartLineRef::Local(VariationId::new(7)), 0)
            .await;

        assert_eq!(engine.display_items().len(), 1);
        assert_eq!(engine.total_item_count(), 1);
    }

    #[tokio::test]
    async fn test_set_quantity_replaces_not_adds() {
        let mut engine = guest_engine();
        engine.add_item(gift_card_line(7, 2, "10.00")).await;

        engine
            .set_quantity(CartLineRef::Local(VariationId::new(7)), 6)
            .await;

        assert_eq!(engine.total_item_count(), 6);
    }

    #[tokio::test]
    async fn test_guest_cart_persists_to_store() {
        let backing = MemoryStore::new();
        {
            let mut engine: CartEngine<NoApi, _> = CartEngine::new(backing.clone());
            engine.add_item(gift_card_line(7, 2, "10.00")).await;
        }

        // New engine over the same store re-loads the lines.
        let engine: CartEngine<NoApi, _> = CartEngine::new(backing);
        assert_eq!(engine.total_item_count(), 2);
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let backing = MemoryStore::new();
        backing.set(GUEST_CART_KEY, "[{broken").unwrap();

        let engine: CartEngine<NoApi, _> = CartEngine::new(backing);
        assert_eq!(engine.total_item_count(), 0);
    }

    #[test]
    fn test_mode_exclusivity_of_reads() {
        let mut engine = guest_engine();
        engine.local_lines.push(gift_card_line(9, 4, "5.00"));
        // Transiently populate the other representation; local mode
        // reads must not see it.
        engine.server_cart = Some(server_cart_fixture());

        assert_eq!(engine.mode(), CartMode::Local);
        assert_eq!(engine.total_item_count(), 4);
        assert_eq!(engine.total_amount(), "20.00".parse().unwrap());

        // And the reverse: server mode ignores leftover local lines.
        engine.phase = CartPhase::Authenticated;
        assert_eq!(engine.total_item_count(), 2);
        assert_eq!(
            engine.display_items()[0].line,
            CartLineRef::Server(CartItemId::new(101))
        );
    }

    #[tokio::test]
    async fn test_server_mode_failure_sets_error_only() {
        let mut engine = guest_engine();
        engine.phase = CartPhase::Authenticated;
        engine.api = Some(NoApi);
        engine.server_cart = Some(server_cart_fixture());

        engine.add_item(gift_card_line(7, 1, "10.00")).await;

        assert!(engine.last_error().is_some());
        // The previous server cart is left as-is on failure.
        assert_eq!(engine.total_item_count(), 2);
        assert!(engine.take_error().is_some());
        assert!(engine.last_error().is_none());
    }

    #[tokio::test]
    async fn test_has_service_items_local_mode() {
        let mut engine = guest_engine();
        assert!(!engine.has_service_items());

        let mut service = gift_card_line(12, 1, "30.00");
        service.kind = ProductKind::Service;
        engine.add_item(service).await;

        assert!(engine.has_service_items());
    }

    #[test]
    fn test_logout_reverts_to_empty_guest() {
        let mut engine = guest_engine();
        engine.phase = CartPhase::Authenticated;
        engine.api = Some(NoApi);
        engine.server_cart = Some(server_cart_fixture());

        engine.on_logout();

        assert_eq!(engine.phase(), CartPhase::Guest);
        assert_eq!(engine.mode(), CartMode::Local);
        assert_eq!(engine.total_item_count(), 0);
        assert!(engine.display_items().is_empty());
    }
}
