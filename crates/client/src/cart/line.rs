//! Guest cart lines.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use giftsouq_core::{Email, ProductKind, VariationId};

/// How a service product's account should be provisioned at
/// fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProvisioningMode {
    /// Deliver into an account the customer already owns.
    UseExisting,
    /// Create a fresh account with the given details.
    CreateNew,
}

/// Account details collected for service-kind products.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProvisioning {
    /// Desired account email.
    pub email: Email,
    /// Desired account password.
    pub password: String,
    /// Existing account or new one.
    pub mode: ProvisioningMode,
}

impl fmt::Debug for AccountProvisioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountProvisioning")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("mode", &self.mode)
            .finish()
    }
}

/// One product-variation selection held locally before
/// authentication.
///
/// Lines are uniqued by variation id; the display fields are
/// denormalized copies of whatever the catalog said when the item was
/// added, and the backend re-prices everything during the merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCartLine {
    /// The selected variation.
    pub variation_id: VariationId,
    /// Quantity, at least 1 (a zero-quantity line is removed instead).
    pub quantity: u32,
    /// Product display name.
    pub product_name: String,
    /// Variation display name.
    pub variation_name: String,
    /// Product kind.
    pub kind: ProductKind,
    /// Unit price as last seen in the catalog.
    pub price: Decimal,
    /// Product photo, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Account details for service-kind products.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning: Option<AccountProvisioning>,
}

impl LocalCartLine {
    /// Line total at the locally known unit price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Merge `incoming` into `lines`.
///
/// An existing line for the same variation has its quantity summed and
/// its display metadata (and provisioning fields) replaced wholesale -
/// last write wins for everything except quantity. A miss appends.
pub(crate) fn upsert(lines: &mut Vec<LocalCartLine>, incoming: LocalCartLine) {
    if let Some(existing) = lines
        .iter_mut()
        .find(|line| line.variation_id == incoming.variation_id)
    {
        let quantity = existing.quantity + incoming.quantity;
        *existing = LocalCartLine {
            quantity,
            ..incoming
        };
    } else {
        lines.push(incoming);
    }
}
