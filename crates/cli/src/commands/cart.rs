//! Cart commands: show, add, remove, set-amount.
//!
//! Each invocation is one storefront "session": the store loads the
//! persisted snapshot, runs the operation, and the committed result is
//! already durable when the process exits.

#![allow(clippy::print_stdout, clippy::print_stderr)] // terminal UI

use std::sync::Arc;

use rocket_shoes_cart::catalog::HttpCatalog;
use rocket_shoes_cart::config::CartConfig;
use rocket_shoes_cart::notify::Notifier;
use rocket_shoes_cart::storage::FileStore;
use rocket_shoes_cart::store::{CartStore, UpdateProductAmount};
use rocket_shoes_core::{CartItem, ProductId};

/// Notifier that prints the toast text to stderr.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify_error(&self, message: &str) {
        eprintln!("error: {message}");
    }
}

/// Load the cart store from configuration.
async fn load_store() -> Result<CartStore, Box<dyn std::error::Error>> {
    let config = CartConfig::from_env()?;

    let catalog = Arc::new(HttpCatalog::new(&config));
    let storage = Arc::new(FileStore::new(config.storage_file()));
    let notifier = Arc::new(ConsoleNotifier);

    Ok(CartStore::load(catalog, storage, notifier).await)
}

/// Print one cart line: id, amount, and title/price metadata when present.
fn print_item(item: &CartItem) {
    let title = item
        .metadata
        .get("title")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("(untitled)");
    let price = item
        .metadata
        .get("price")
        .and_then(serde_json::Value::as_f64);

    match price {
        Some(price) => println!("{:>6}  x{:<3}  {title}  R$ {price:.2}", item.id, item.amount),
        None => println!("{:>6}  x{:<3}  {title}", item.id, item.amount),
    }
}

fn print_cart(store: &CartStore) {
    let cart = store.cart();
    if cart.is_empty() {
        println!("cart is empty");
        return;
    }
    for item in cart.iter() {
        print_item(item);
    }
}

/// Print the current cart.
pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store().await?;
    print_cart(&store);
    Ok(())
}

/// Add one unit of a product.
pub async fn add(product_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store().await?;
    store.add_product(ProductId::new(product_id)).await;
    print_cart(&store);
    Ok(())
}

/// Remove a product line.
pub async fn remove(product_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store().await?;
    store.remove_product(ProductId::new(product_id)).await;
    print_cart(&store);
    Ok(())
}

/// Set the absolute quantity of a product.
pub async fn set_amount(product_id: i64, amount: u32) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store().await?;
    store
        .update_product_amount(UpdateProductAmount {
            product_id: ProductId::new(product_id),
            amount,
        })
        .await;
    print_cart(&store);
    Ok(())
}
