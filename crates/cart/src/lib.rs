//! RocketShoes cart store library.
//!
//! Maintains the in-memory cart for a storefront session, keeps a durable
//! snapshot in sync with it, and mediates every mutation through a stock
//! check against the remote catalog.
//!
//! # Architecture
//!
//! - [`store::CartStore`] - the shared cart handle: read view plus the
//!   three mutation operations
//! - [`catalog`] - the remote stock/product lookup seam and its reqwest
//!   implementation
//! - [`storage`] - the string-keyed durable snapshot store
//! - [`notify`] - the fire-and-forget toast seam
//! - [`config`] - environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rocket_shoes_cart::catalog::HttpCatalog;
//! use rocket_shoes_cart::config::CartConfig;
//! use rocket_shoes_cart::notify::TracingNotifier;
//! use rocket_shoes_cart::storage::FileStore;
//! use rocket_shoes_cart::store::CartStore;
//! use rocket_shoes_core::ProductId;
//!
//! let config = CartConfig::from_env()?;
//! let store = CartStore::load(
//!     Arc::new(HttpCatalog::new(&config)),
//!     Arc::new(FileStore::new(config.storage_file())),
//!     Arc::new(TracingNotifier),
//! )
//! .await;
//!
//! store.add_product(ProductId::new(1)).await;
//! for item in store.cart().iter() {
//!     println!("{} x{}", item.id, item.amount);
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod storage;
pub mod store;

pub use error::CartError;
pub use store::{CartStore, UpdateProductAmount, CART_STORAGE_KEY};
