//! The cart store: shared state, mutation operations, persistence rule.

use std::sync::{Arc, PoisonError, RwLock};

use rocket_shoes_core::{CartItem, ProductId};

use crate::catalog::Catalog;
use crate::error::CartError;
use crate::notify::{Notifier, messages};
use crate::storage::SnapshotStore;

/// Storage key of the serialized cart snapshot.
pub const CART_STORAGE_KEY: &str = "@RocketShoes:cart";

/// Input for [`CartStore::update_product_amount`].
#[derive(Debug, Clone, Copy)]
pub struct UpdateProductAmount {
    /// Product whose quantity to change.
    pub product_id: ProductId,
    /// Requested absolute quantity. `0` is a silent no-op.
    pub amount: u32,
}

/// Which operation a failure belongs to, for notification mapping.
#[derive(Debug, Clone, Copy)]
enum Operation {
    Add,
    Remove,
    Update,
}

impl Operation {
    const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => messages::ADD_FAILED,
            Self::Remove => messages::REMOVE_FAILED,
            Self::Update => messages::UPDATE_FAILED,
        }
    }
}

/// The shared cart store.
///
/// Holds the current cart (an ordered, id-unique sequence of [`CartItem`]),
/// exposes the three mutation operations plus a read view, and keeps the
/// durable snapshot in sync with committed state. The handle is cheaply
/// cloneable; every clone observes the same cart.
///
/// # Failure contract
///
/// Operations never return errors. Any failure - stock refusal, missing
/// entry, transport error - is caught at the operation boundary, logged,
/// and surfaced to the user as one fixed notification text, with the cart
/// left exactly as it was (the previous snapshot stays pointer-identical).
///
/// # Concurrency
///
/// The cart is replaced wholesale on each committed operation; the lock is
/// held only for the swap, never across an await. Operations snapshot the
/// cart before their remote lookups and commit afterwards, so two
/// overlapping mutations for the same product can interleave at the
/// suspension points and the later commit wins (a lost-update race the
/// storefront has always had). Mutations are not serialized per product.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    catalog: Arc<dyn Catalog>,
    storage: Arc<dyn SnapshotStore>,
    notifier: Arc<dyn Notifier>,
    cart: RwLock<Arc<[CartItem]>>,
}

impl CartStore {
    /// Initialize the store from the persisted snapshot.
    ///
    /// A missing key, an unreadable store, or an unparseable snapshot all
    /// fall back to an empty cart with a warning; initialization never
    /// fails.
    pub async fn load(
        catalog: Arc<dyn Catalog>,
        storage: Arc<dyn SnapshotStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let items = match storage.get(CART_STORAGE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartItem>>(&raw) {
                Ok(items) => items,
                Err(error) => {
                    tracing::warn!(%error, "ignoring unparseable cart snapshot");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(error) => {
                tracing::warn!(%error, "failed to read cart snapshot, starting empty");
                Vec::new()
            }
        };

        Self {
            inner: Arc::new(CartStoreInner {
                catalog,
                storage,
                notifier,
                cart: RwLock::new(Arc::from(items)),
            }),
        }
    }

    /// Read-only view of the current cart.
    #[must_use]
    pub fn cart(&self) -> Arc<[CartItem]> {
        self.inner
            .cart
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Add one unit of a product to the cart.
    ///
    /// A product already in the cart has its amount incremented; a new
    /// product is fetched from the catalog and appended with amount 1. The
    /// operation is refused with an out-of-stock notification when the
    /// catalog has no more units than the cart already holds.
    pub async fn add_product(&self, product_id: ProductId) {
        if let Err(error) = self.try_add(product_id).await {
            self.report_failure(Operation::Add, &error);
        }
    }

    /// Remove a product line from the cart entirely.
    pub async fn remove_product(&self, product_id: ProductId) {
        if let Err(error) = self.try_remove(product_id).await {
            self.report_failure(Operation::Remove, &error);
        }
    }

    /// Set the absolute quantity of a product already in the cart.
    ///
    /// An amount of `0` is a silent no-op: no state change and no
    /// notification.
    pub async fn update_product_amount(&self, update: UpdateProductAmount) {
        if update.amount == 0 {
            return;
        }

        if let Err(error) = self.try_update(update).await {
            self.report_failure(Operation::Update, &error);
        }
    }

    // =========================================================================
    // Operation internals
    // =========================================================================

    async fn try_add(&self, product_id: ProductId) -> Result<(), CartError> {
        let current = self.cart();
        let amount_in_cart = current
            .iter()
            .find(|item| item.id == product_id)
            .map_or(0, |item| item.amount);

        let stock = self.inner.catalog.stock(product_id).await?;
        if stock.amount <= amount_in_cart {
            return Err(CartError::OutOfStock(product_id));
        }

        let mut items = current.to_vec();
        if let Some(item) = items.iter_mut().find(|item| item.id == product_id) {
            item.amount = amount_in_cart + 1;
        } else {
            let product = self.inner.catalog.product(product_id).await?;
            items.push(CartItem::from_product(product));
        }

        self.commit(items).await;
        Ok(())
    }

    async fn try_remove(&self, product_id: ProductId) -> Result<(), CartError> {
        let current = self.cart();
        if !current.iter().any(|item| item.id == product_id) {
            return Err(CartError::NotInCart(product_id));
        }

        let items = current
            .iter()
            .filter(|item| item.id != product_id)
            .cloned()
            .collect();

        self.commit(items).await;
        Ok(())
    }

    async fn try_update(&self, update: UpdateProductAmount) -> Result<(), CartError> {
        let stock = self.inner.catalog.stock(update.product_id).await?;
        if update.amount > stock.amount {
            return Err(CartError::OutOfStock(update.product_id));
        }

        let mut items = self.cart().to_vec();
        let Some(item) = items.iter_mut().find(|item| item.id == update.product_id) else {
            return Err(CartError::NotInCart(update.product_id));
        };
        item.amount = update.amount;

        self.commit(items).await;
        Ok(())
    }

    /// Replace the current cart and persist the new snapshot.
    async fn commit(&self, items: Vec<CartItem>) {
        let next: Arc<[CartItem]> = Arc::from(items);

        {
            let mut guard = self
                .inner
                .cart
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *guard = next.clone();
        }

        self.persist(&next).await;
    }

    /// Write the serialized snapshot to durable storage.
    ///
    /// Persistence is a side effect of committing, not part of the
    /// operation contract: a failed write is logged and the committed
    /// in-memory state stands.
    async fn persist(&self, items: &[CartItem]) {
        match serde_json::to_string(items) {
            Ok(raw) => {
                if let Err(error) = self.inner.storage.set(CART_STORAGE_KEY, &raw).await {
                    tracing::error!(%error, "failed to persist cart snapshot");
                }
            }
            Err(error) => {
                tracing::error!(%error, "failed to serialize cart snapshot");
            }
        }
    }

    fn report_failure(&self, operation: Operation, error: &CartError) {
        let message = match error {
            CartError::OutOfStock(_) => messages::OUT_OF_STOCK,
            CartError::NotInCart(_) | CartError::Catalog(_) => operation.failure_message(),
        };

        tracing::warn!(?operation, %error, "cart operation failed");
        self.inner.notifier.notify_error(message);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use rocket_shoes_core::{Product, StockLevel};

    use super::*;
    use crate::catalog::CatalogError;
    use crate::storage::MemoryStore;

    // =========================================================================
    // Test doubles
    // =========================================================================

    /// Catalog fake backed by static maps, with a failure switch.
    struct StaticCatalog {
        products: HashMap<i64, Product>,
        stock: HashMap<i64, u32>,
        fail: AtomicBool,
    }

    impl StaticCatalog {
        fn new(entries: &[(i64, &str, u32)]) -> Self {
            let mut products = HashMap::new();
            let mut stock = HashMap::new();
            for &(id, raw, available) in entries {
                products.insert(id, serde_json::from_str(raw).unwrap());
                stock.insert(id, available);
            }
            Self {
                products,
                stock,
                fail: AtomicBool::new(false),
            }
        }

        fn fail_requests(&self) {
            self.fail.store(true, Ordering::SeqCst);
        }

        fn check_failure(&self) -> Result<(), CatalogError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(CatalogError::Status {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Catalog for StaticCatalog {
        async fn stock(&self, product_id: ProductId) -> Result<StockLevel, CatalogError> {
            self.check_failure()?;
            self.stock
                .get(&product_id.as_i64())
                .map(|&amount| StockLevel {
                    id: product_id,
                    amount,
                })
                .ok_or(CatalogError::NotFound(product_id))
        }

        async fn product(&self, product_id: ProductId) -> Result<Product, CatalogError> {
            self.check_failure()?;
            self.products
                .get(&product_id.as_i64())
                .cloned()
                .ok_or(CatalogError::NotFound(product_id))
        }
    }

    /// Notifier that records every message it is handed.
    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify_error(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    struct Harness {
        store: CartStore,
        catalog: Arc<StaticCatalog>,
        storage: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
    }

    const SHOE: &str = r#"{"id":1,"title":"Tenis de Caminhada Leve","price":179.9}"#;
    const SANDAL: &str = r#"{"id":2,"title":"Sandalia","price":99.9}"#;
    const SNEAKER: &str = r#"{"id":3,"title":"Tenis Casual","price":139.9}"#;

    async fn harness(entries: &[(i64, &str, u32)], snapshot: Option<&str>) -> Harness {
        let catalog = Arc::new(StaticCatalog::new(entries));
        let storage = Arc::new(match snapshot {
            Some(raw) => MemoryStore::with_entry(CART_STORAGE_KEY, raw),
            None => MemoryStore::new(),
        });
        let notifier = Arc::new(RecordingNotifier::default());

        let store = CartStore::load(
            catalog.clone() as Arc<dyn Catalog>,
            storage.clone() as Arc<dyn SnapshotStore>,
            notifier.clone() as Arc<dyn Notifier>,
        )
        .await;

        Harness {
            store,
            catalog,
            storage,
            notifier,
        }
    }

    async fn persisted(harness: &Harness) -> Option<String> {
        harness.storage.get(CART_STORAGE_KEY).await.unwrap()
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    #[tokio::test]
    async fn test_load_empty_when_no_snapshot() {
        let h = harness(&[(1, SHOE, 5)], None).await;
        assert!(h.store.cart().is_empty());
    }

    #[tokio::test]
    async fn test_load_restores_snapshot() {
        let snapshot = r#"[{"id":1,"title":"Tenis","price":139.9,"amount":2}]"#;
        let h = harness(&[(1, SHOE, 5)], Some(snapshot)).await;

        let cart = h.store.cart();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.first().unwrap().id, ProductId::new(1));
        assert_eq!(cart.first().unwrap().amount, 2);
    }

    #[tokio::test]
    async fn test_load_falls_back_on_corrupt_snapshot() {
        let h = harness(&[(1, SHOE, 5)], Some("not json at all")).await;
        assert!(h.store.cart().is_empty());
        // Initialization is silent; no toast for a bad snapshot
        assert!(h.notifier.messages().is_empty());
    }

    // =========================================================================
    // add_product
    // =========================================================================

    #[tokio::test]
    async fn test_add_new_product_appends_with_amount_one() {
        let h = harness(&[(1, SHOE, 5)], None).await;

        h.store.add_product(ProductId::new(1)).await;

        let cart = h.store.cart();
        assert_eq!(cart.len(), 1);
        let item = cart.first().unwrap();
        assert_eq!(item.id, ProductId::new(1));
        assert_eq!(item.amount, 1);
        // Metadata copied verbatim from the catalog
        assert_eq!(
            item.metadata.get("title").and_then(serde_json::Value::as_str),
            Some("Tenis de Caminhada Leve")
        );
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_add_existing_product_increments_without_duplicate() {
        let h = harness(&[(1, SHOE, 5)], None).await;

        h.store.add_product(ProductId::new(1)).await;
        h.store.add_product(ProductId::new(1)).await;

        let cart = h.store.cart();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.first().unwrap().amount, 2);
    }

    #[tokio::test]
    async fn test_add_refused_at_stock_ceiling() {
        // Cart already holds 1, stock is 1: currentAmountInCart >= stock
        let snapshot = r#"[{"id":1,"title":"Tenis","price":139.9,"amount":1}]"#;
        let h = harness(&[(1, SHOE, 1)], Some(snapshot)).await;

        let before = h.store.cart();
        h.store.add_product(ProductId::new(1)).await;

        assert!(Arc::ptr_eq(&before, &h.store.cart()));
        assert_eq!(h.notifier.messages(), vec![messages::OUT_OF_STOCK]);
    }

    #[tokio::test]
    async fn test_add_refused_when_stock_is_zero() {
        let h = harness(&[(1, SHOE, 0)], None).await;

        h.store.add_product(ProductId::new(1)).await;

        assert!(h.store.cart().is_empty());
        assert_eq!(h.notifier.messages(), vec![messages::OUT_OF_STOCK]);
    }

    #[tokio::test]
    async fn test_add_unknown_product_reports_generic_error() {
        let h = harness(&[(1, SHOE, 5)], None).await;

        let before = h.store.cart();
        h.store.add_product(ProductId::new(99)).await;

        assert!(Arc::ptr_eq(&before, &h.store.cart()));
        assert_eq!(h.notifier.messages(), vec![messages::ADD_FAILED]);
    }

    #[tokio::test]
    async fn test_add_transport_failure_leaves_cart_untouched() {
        let h = harness(&[(1, SHOE, 5)], None).await;
        h.catalog.fail_requests();

        let before = h.store.cart();
        h.store.add_product(ProductId::new(1)).await;

        assert!(Arc::ptr_eq(&before, &h.store.cart()));
        assert_eq!(h.notifier.messages(), vec![messages::ADD_FAILED]);
        // Nothing was persisted either
        assert_eq!(persisted(&h).await, None);
    }

    #[tokio::test]
    async fn test_add_persists_committed_snapshot() {
        let h = harness(&[(1, SHOE, 5)], None).await;

        h.store.add_product(ProductId::new(1)).await;

        let raw = persisted(&h).await.unwrap();
        let items: Vec<CartItem> = serde_json::from_str(&raw).unwrap();
        assert_eq!(items, h.store.cart().to_vec());
    }

    // =========================================================================
    // remove_product
    // =========================================================================

    #[tokio::test]
    async fn test_remove_present_product() {
        let snapshot = r#"[{"id":1,"amount":1},{"id":2,"amount":3}]"#;
        let h = harness(&[], Some(snapshot)).await;

        h.store.remove_product(ProductId::new(1)).await;

        let cart = h.store.cart();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.first().unwrap().id, ProductId::new(2));
        assert!(h.notifier.messages().is_empty());

        let raw = persisted(&h).await.unwrap();
        let items: Vec<CartItem> = serde_json::from_str(&raw).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_absent_product_reports_error() {
        let snapshot = r#"[{"id":2,"amount":1}]"#;
        let h = harness(&[], Some(snapshot)).await;

        let before = h.store.cart();
        h.store.remove_product(ProductId::new(5)).await;

        assert!(Arc::ptr_eq(&before, &h.store.cart()));
        assert_eq!(h.notifier.messages(), vec![messages::REMOVE_FAILED]);
        // The snapshot in storage is still the seeded one
        assert_eq!(persisted(&h).await.as_deref(), Some(snapshot));
    }

    #[tokio::test]
    async fn test_remove_preserves_order_of_remaining_items() {
        let snapshot = r#"[{"id":1,"amount":1},{"id":2,"amount":1},{"id":3,"amount":1}]"#;
        let h = harness(&[], Some(snapshot)).await;

        h.store.remove_product(ProductId::new(2)).await;

        let ids: Vec<i64> = h.store.cart().iter().map(|i| i.id.as_i64()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    // =========================================================================
    // update_product_amount
    // =========================================================================

    #[tokio::test]
    async fn test_update_zero_amount_is_silent_noop() {
        let snapshot = r#"[{"id":1,"amount":2}]"#;
        let h = harness(&[(1, SHOE, 5)], Some(snapshot)).await;

        let before = h.store.cart();
        h.store
            .update_product_amount(UpdateProductAmount {
                product_id: ProductId::new(1),
                amount: 0,
            })
            .await;

        assert!(Arc::ptr_eq(&before, &h.store.cart()));
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_update_within_stock_sets_amount() {
        let snapshot = r#"[{"id":3,"title":"Tenis Casual","price":139.9,"amount":1}]"#;
        let h = harness(&[(3, SNEAKER, 10)], Some(snapshot)).await;

        h.store
            .update_product_amount(UpdateProductAmount {
                product_id: ProductId::new(3),
                amount: 4,
            })
            .await;

        let cart = h.store.cart();
        assert_eq!(cart.first().unwrap().amount, 4);
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_update_above_stock_is_refused() {
        let snapshot = r#"[{"id":1,"amount":2}]"#;
        let h = harness(&[(1, SHOE, 3)], Some(snapshot)).await;

        let before = h.store.cart();
        h.store
            .update_product_amount(UpdateProductAmount {
                product_id: ProductId::new(1),
                amount: 4,
            })
            .await;

        assert!(Arc::ptr_eq(&before, &h.store.cart()));
        assert_eq!(h.notifier.messages(), vec![messages::OUT_OF_STOCK]);
    }

    #[tokio::test]
    async fn test_update_amount_equal_to_stock_is_allowed() {
        let snapshot = r#"[{"id":1,"amount":1}]"#;
        let h = harness(&[(1, SHOE, 3)], Some(snapshot)).await;

        h.store
            .update_product_amount(UpdateProductAmount {
                product_id: ProductId::new(1),
                amount: 3,
            })
            .await;

        assert_eq!(h.store.cart().first().unwrap().amount, 3);
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_update_absent_product_reports_error() {
        let h = harness(&[(2, SANDAL, 5)], None).await;

        let before = h.store.cart();
        h.store
            .update_product_amount(UpdateProductAmount {
                product_id: ProductId::new(2),
                amount: 1,
            })
            .await;

        assert!(Arc::ptr_eq(&before, &h.store.cart()));
        assert_eq!(h.notifier.messages(), vec![messages::UPDATE_FAILED]);
    }

    #[tokio::test]
    async fn test_update_transport_failure_reports_generic_error() {
        let snapshot = r#"[{"id":1,"amount":2}]"#;
        let h = harness(&[(1, SHOE, 5)], Some(snapshot)).await;
        h.catalog.fail_requests();

        let before = h.store.cart();
        h.store
            .update_product_amount(UpdateProductAmount {
                product_id: ProductId::new(1),
                amount: 3,
            })
            .await;

        assert!(Arc::ptr_eq(&before, &h.store.cart()));
        assert_eq!(h.notifier.messages(), vec![messages::UPDATE_FAILED]);
    }

    // =========================================================================
    // Persistence round-trip
    // =========================================================================

    #[tokio::test]
    async fn test_snapshot_roundtrip_through_fresh_store() {
        let h = harness(&[(1, SHOE, 5), (2, SANDAL, 5)], None).await;

        h.store.add_product(ProductId::new(1)).await;
        h.store.add_product(ProductId::new(2)).await;
        h.store.add_product(ProductId::new(1)).await;
        let original = h.store.cart();

        // A fresh store over the same storage sees the same cart
        let reloaded = CartStore::load(
            h.catalog.clone() as Arc<dyn Catalog>,
            h.storage.clone() as Arc<dyn SnapshotStore>,
            Arc::new(RecordingNotifier::default()) as Arc<dyn Notifier>,
        )
        .await;

        assert_eq!(reloaded.cart().to_vec(), original.to_vec());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let h = harness(&[(1, SHOE, 5)], None).await;
        let clone = h.store.clone();

        h.store.add_product(ProductId::new(1)).await;

        assert_eq!(clone.cart().len(), 1);
        assert!(Arc::ptr_eq(&clone.cart(), &h.store.cart()));
    }
}
