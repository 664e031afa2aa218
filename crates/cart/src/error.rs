//! Cart operation failure reasons.

use rocket_shoes_core::ProductId;
use thiserror::Error;

use crate::catalog::CatalogError;

/// Why a cart operation was aborted.
///
/// These reasons never escape the store's public operations: each operation
/// catches its `CartError`, logs it, and maps it to one of the fixed
/// notification texts. Callers deliberately cannot distinguish a missing
/// cart entry from a transport failure - both surface as the operation's
/// generic message, as the storefront has always behaved.
#[derive(Debug, Error)]
pub enum CartError {
    /// The requested quantity exceeds what the catalog has in stock.
    #[error("requested quantity for product {0} exceeds available stock")]
    OutOfStock(ProductId),

    /// The targeted product is not in the cart.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Stock or product lookup failed.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::NotInCart(ProductId::new(5));
        assert_eq!(err.to_string(), "product 5 is not in the cart");

        let err = CartError::OutOfStock(ProductId::new(1));
        assert_eq!(
            err.to_string(),
            "requested quantity for product 1 exceeds available stock"
        );
    }

    #[test]
    fn test_catalog_error_converts() {
        let err = CartError::from(CatalogError::NotFound(ProductId::new(9)));
        assert!(matches!(err, CartError::Catalog(_)));
    }
}
