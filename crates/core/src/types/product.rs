//! Catalog records returned by the remote product and stock endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;

/// A product record from `GET /products/{id}`.
///
/// Only the `id` is meaningful to the cart logic. Everything else the
/// catalog returns (name, price, image, ...) is carried verbatim in the
/// flattened [`metadata`](Self::metadata) map and passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Opaque product metadata, copied verbatim from the catalog.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// Available quantity for a product, from `GET /stock/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// Product this stock level refers to.
    pub id: ProductId,
    /// Units currently available.
    pub amount: u32,
}
