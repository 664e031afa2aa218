//! Catalog client for the storefront REST API.
//!
//! Uses `reqwest` for HTTP. Product records are cached with `moka`
//! (5-minute TTL); stock levels are never cached, since availability must
//! be observed at the time of each mutating operation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::StatusCode;
use rocket_shoes_core::{Product, ProductId, StockLevel};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{Catalog, CatalogError};
use crate::config::CartConfig;

/// Client for the catalog API.
///
/// Provides stock and product lookups. Product metadata is cached for
/// 5 minutes; stock is fetched fresh on every call.
#[derive(Clone)]
pub struct HttpCatalog {
    inner: Arc<HttpCatalogInner>,
}

struct HttpCatalogInner {
    client: reqwest::Client,
    base_url: String,
    products: Cache<ProductId, Product>,
}

impl HttpCatalog {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CartConfig) -> Self {
        let products = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(HttpCatalogInner {
                client: reqwest::Client::new(),
                base_url: config.api_url.clone(),
                products,
            }),
        }
    }

    /// Execute a GET request and decode the JSON response.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let url = format!("{}/{path}", self.inner.base_url);

        let response = self.inner.client.get(&url).send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                url = %url,
                body = %response_text.chars().take(500).collect::<String>(),
                "catalog API returned non-success status"
            );
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: response_text.chars().take(200).collect(),
            });
        }

        match serde_json::from_str(&response_text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    url = %url,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "failed to parse catalog response"
                );
                Err(CatalogError::Parse(e))
            }
        }
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    /// Get the available quantity for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request
    /// fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn stock(&self, product_id: ProductId) -> Result<StockLevel, CatalogError> {
        match self.get_json(&format!("stock/{product_id}")).await {
            Err(CatalogError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                Err(CatalogError::NotFound(product_id))
            }
            other => other,
        }
    }

    /// Get the full metadata record for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request
    /// fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn product(&self, product_id: ProductId) -> Result<Product, CatalogError> {
        // Check cache
        if let Some(product) = self.inner.products.get(&product_id).await {
            debug!("cache hit for product");
            return Ok(product);
        }

        let product: Product = match self.get_json(&format!("products/{product_id}")).await {
            Err(CatalogError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                return Err(CatalogError::NotFound(product_id));
            }
            other => other?,
        };

        self.inner.products.insert(product_id, product.clone()).await;

        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_config(api_url: &str) -> CartConfig {
        CartConfig {
            api_url: api_url.to_string(),
            data_dir: PathBuf::from("/tmp/rocketshoes-test"),
        }
    }

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::NotFound(ProductId::new(123));
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = CatalogError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected status 502: bad gateway");
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        // Nothing listens on this port; the request must fail with a
        // transport error, not a panic.
        let catalog = HttpCatalog::new(&test_config("http://127.0.0.1:9"));
        let err = catalog.stock(ProductId::new(1)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Http(_)));
    }
}
