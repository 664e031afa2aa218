//! Remote catalog collaborators: stock and product lookups.
//!
//! The cart store consumes the inventory service through the narrow
//! [`Catalog`] seam; [`HttpCatalog`] is the production implementation
//! against the storefront's REST API.

mod http;

pub use http::HttpCatalog;

use async_trait::async_trait;
use rocket_shoes_core::{Product, ProductId, StockLevel};
use thiserror::Error;

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Product unknown to the catalog.
    #[error("Not found: product {0}")]
    NotFound(ProductId),

    /// Catalog returned an unexpected status code.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body for diagnostics.
        body: String,
    },
}

/// Stock and product lookups against the remote inventory service.
///
/// Both calls are suspension points: the cart store may be interleaved with
/// other operations while a lookup is in flight.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Available quantity for a product.
    async fn stock(&self, product_id: ProductId) -> Result<StockLevel, CatalogError>;

    /// Full product metadata record.
    async fn product(&self, product_id: ProductId) -> Result<Product, CatalogError>;
}
