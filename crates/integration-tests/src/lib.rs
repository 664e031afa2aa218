//! Integration test support for the RocketShoes cart.
//!
//! Provides a mock catalog HTTP server (the `/products/{id}` and
//! `/stock/{id}` endpoints the cart consumes) with scriptable stock levels
//! and failure injection, plus a [`TestContext`] that wires a real
//! [`CartStore`] to the mock server and an on-disk snapshot store in a
//! temporary directory.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocket-shoes-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tempfile::TempDir;

use rocket_shoes_cart::catalog::HttpCatalog;
use rocket_shoes_cart::config::CartConfig;
use rocket_shoes_cart::notify::Notifier;
use rocket_shoes_cart::storage::FileStore;
use rocket_shoes_cart::store::CartStore;

// =============================================================================
// Mock catalog server
// =============================================================================

#[derive(Default)]
struct MockCatalogState {
    products: Mutex<HashMap<i64, Value>>,
    stock: Mutex<HashMap<i64, u32>>,
    fail_requests: AtomicBool,
}

/// A catalog API stub listening on an ephemeral local port.
pub struct MockCatalogServer {
    /// Base URL of the running server, e.g. `http://127.0.0.1:49152`.
    pub base_url: String,
    state: Arc<MockCatalogState>,
}

impl MockCatalogServer {
    /// Start the mock server on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state = Arc::new(MockCatalogState::default());

        let app = Router::new()
            .route("/products/{id}", get(get_product))
            .route("/stock/{id}", get(get_stock))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock catalog listener");
        let addr = listener.local_addr().expect("mock catalog local addr");

        tokio::spawn(async move {
            // Lives until the test runtime shuts down
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Register a product with its metadata and available stock.
    pub fn seed_product(&self, id: i64, metadata: Value, stock: u32) {
        self.state
            .products
            .lock()
            .expect("products lock")
            .insert(id, metadata);
        self.set_stock(id, stock);
    }

    /// Change the available stock for a product.
    pub fn set_stock(&self, id: i64, amount: u32) {
        self.state
            .stock
            .lock()
            .expect("stock lock")
            .insert(id, amount);
    }

    /// Make every endpoint answer 500 until reset.
    pub fn fail_requests(&self, fail: bool) {
        self.state.fail_requests.store(fail, Ordering::SeqCst);
    }
}

async fn get_product(
    State(state): State<Arc<MockCatalogState>>,
    Path(id): Path<i64>,
) -> Response {
    if state.fail_requests.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    state
        .products
        .lock()
        .expect("products lock")
        .get(&id)
        .map_or_else(
            || StatusCode::NOT_FOUND.into_response(),
            |metadata| Json(metadata.clone()).into_response(),
        )
}

async fn get_stock(State(state): State<Arc<MockCatalogState>>, Path(id): Path<i64>) -> Response {
    if state.fail_requests.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    state.stock.lock().expect("stock lock").get(&id).map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |amount| Json(json!({ "id": id, "amount": amount })).into_response(),
    )
}

// =============================================================================
// Test context
// =============================================================================

/// Notifier that records every toast message for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// All messages seen so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("messages lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_error(&self, message: &str) {
        self.messages
            .lock()
            .expect("messages lock")
            .push(message.to_string());
    }
}

/// A full cart wired to the mock catalog and a tempdir-backed snapshot file.
pub struct TestContext {
    /// The running mock catalog.
    pub catalog: MockCatalogServer,
    /// The cart store under test.
    pub store: CartStore,
    /// Recorded toast messages.
    pub notices: Arc<RecordingNotifier>,
    config: CartConfig,
    // Kept alive so the snapshot directory survives the test
    _data_dir: TempDir,
}

impl TestContext {
    /// Start a mock catalog and load a fresh store over an empty tempdir.
    ///
    /// # Panics
    ///
    /// Panics if the mock server or temp directory cannot be created.
    pub async fn new() -> Self {
        let catalog = MockCatalogServer::start().await;
        let data_dir = tempfile::tempdir().expect("create temp data dir");

        let config = CartConfig {
            api_url: catalog.base_url.clone(),
            data_dir: PathBuf::from(data_dir.path()),
        };

        let notices = Arc::new(RecordingNotifier::default());
        let store = CartStore::load(
            Arc::new(HttpCatalog::new(&config)),
            Arc::new(FileStore::new(config.storage_file())),
            notices.clone(),
        )
        .await;

        Self {
            catalog,
            store,
            notices,
            config,
            _data_dir: data_dir,
        }
    }

    /// Load a second store over the same snapshot file, as a process
    /// restart would.
    pub async fn reload_store(&self) -> CartStore {
        CartStore::load(
            Arc::new(HttpCatalog::new(&self.config)),
            Arc::new(FileStore::new(self.config.storage_file())),
            Arc::new(RecordingNotifier::default()),
        )
        .await
    }

    /// Raw contents of the snapshot file, if it exists.
    pub async fn snapshot_file(&self) -> Option<String> {
        tokio::fs::read_to_string(self.config.storage_file())
            .await
            .ok()
    }
}
