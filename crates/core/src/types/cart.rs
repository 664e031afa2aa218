//! Cart line items.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;
use super::product::Product;

/// One product line in the cart: a product plus its requested quantity.
///
/// While an item is present in the cart its `amount` is at least 1; a line
/// whose quantity would drop to zero is removed outright rather than kept.
/// The serialized form is the flat JSON object the storefront has always
/// persisted, e.g. `{"id":1,"title":"...","price":139.9,"amount":2}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Unique product identifier.
    pub id: ProductId,
    /// Requested quantity.
    pub amount: u32,
    /// Opaque product metadata, copied from the catalog on first insertion.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl CartItem {
    /// Build a new cart line from a catalog product with `amount = 1`.
    ///
    /// Shadow `id`/`amount` keys in the metadata map are dropped so the
    /// typed fields stay authoritative in the serialized snapshot.
    #[must_use]
    pub fn from_product(product: Product) -> Self {
        let mut metadata = product.metadata;
        metadata.remove("id");
        metadata.remove("amount");

        Self {
            id: product.id,
            amount: 1,
            metadata,
        }
    }
}
