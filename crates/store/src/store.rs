//! The cart store: shared in-memory state, change notification, and
//! persistence.
//!
//! The cart lives inside a [`watch`] channel, which makes a mutation and its
//! subscriber notification one atomic step. Every committed mutation then
//! enqueues an encoded snapshot for the background flusher, so the ordering
//! per operation is: state update, notify, persist write issued. Callers
//! never wait for the write; subscribers may observe a new cart state before
//! it has reached storage.

use std::sync::Arc;

use basket_core::{Cart, NewLineItem, ProductId};
use tokio::sync::watch;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::flush::{self, FlushHandle, PersistFailure};
use crate::persist;
use crate::storage::{FileBackend, StorageBackend};

/// Storage keys used by the cart store.
pub mod storage_keys {
    /// Key under which the serialized cart is stored.
    pub const PRODUCTS: &str = "products";
}

/// Shared, persistent cart state container.
///
/// Cheap to share via [`Arc`]; all operations take `&self`. Mutations are
/// synchronous with respect to the in-memory cart, persistence is issued
/// asynchronously. Construct inside a Tokio runtime (the store spawns its
/// flusher task on creation).
pub struct CartStore {
    products: watch::Sender<Cart>,
    backend: Arc<dyn StorageBackend>,
    flusher: FlushHandle,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore").finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create a store over the given backend with default settings.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_config(backend, &StoreConfig::default())
    }

    /// Create a store over the given backend with explicit settings.
    #[must_use]
    pub fn with_config(backend: Arc<dyn StorageBackend>, config: &StoreConfig) -> Self {
        let (products, _) = watch::channel(Cart::new());
        let flusher = flush::spawn(
            Arc::clone(&backend),
            storage_keys::PRODUCTS,
            config.flush_retries,
            config.flush_retry_delay,
        );

        Self {
            products,
            backend,
            flusher,
        }
    }

    /// Create a store over a [`FileBackend`] rooted at the configured
    /// storage directory.
    #[must_use]
    pub fn open(config: &StoreConfig) -> Self {
        Self::with_config(Arc::new(FileBackend::new(&config.storage_dir)), config)
    }

    /// Restore the cart from storage. Invoke once, at initialization.
    ///
    /// An absent value leaves the cart empty and is not an error. A present
    /// value is decoded and installed as the cart (subscribers are
    /// notified); no persistence write is issued for a load.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`](crate::error::CartError::Storage) if
    /// the backend read fails (the store stays usable with an empty cart)
    /// and [`CartError::Decode`](crate::error::CartError::Decode) if the
    /// stored value is malformed or carries an unsupported schema version.
    pub async fn load(&self) -> Result<()> {
        let stored = match self.backend.get(storage_keys::PRODUCTS).await {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read persisted cart; starting empty");
                return Err(err.into());
            }
        };

        let Some(raw) = stored else {
            tracing::debug!("no persisted cart found; starting empty");
            return Ok(());
        };

        let cart = persist::decode(&raw)?;
        tracing::info!(items = cart.len(), "restored cart from storage");
        self.products.send_replace(cart);
        Ok(())
    }

    /// Add a product to the cart, merging by ID.
    ///
    /// An existing line item with the same ID has its quantity incremented
    /// by 1; otherwise a new line item is appended with quantity 1. Adding
    /// a product twice is defined behavior, never an error.
    pub fn add_to_cart(&self, item: NewLineItem) {
        self.products.send_modify(|cart| cart.add(item));
        self.persist_snapshot();
    }

    /// Increment the quantity of the line item with the given ID by 1.
    ///
    /// A missing ID is a no-op: no state change, no notification, no
    /// persistence call.
    pub fn increment(&self, id: &ProductId) {
        if self.products.send_if_modified(|cart| cart.increment(id)) {
            self.persist_snapshot();
        }
    }

    /// Decrement the quantity of the line item with the given ID by 1.
    ///
    /// A missing ID is a no-op. The quantity is not floored; see
    /// [`Cart::decrement`].
    pub fn decrement(&self, id: &ProductId) {
        if self.products.send_if_modified(|cart| cart.decrement(id)) {
            self.persist_snapshot();
        }
    }

    /// Snapshot of the current cart.
    #[must_use]
    pub fn products(&self) -> Cart {
        self.products.borrow().clone()
    }

    /// Subscribe to cart changes.
    ///
    /// Receivers observe every committed cart state. The notification for a
    /// mutation is visible before its persistence write completes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.products.subscribe()
    }

    /// Wait until every persistence write enqueued before this call has
    /// been attempted. Useful for shutdown paths and tests.
    pub async fn sync(&self) {
        self.flusher.sync().await;
    }

    /// Observe persistence failures.
    ///
    /// Carries the most recent write that exhausted its retries, or `None`
    /// once a later write lands.
    #[must_use]
    pub fn last_persist_error(&self) -> watch::Receiver<Option<PersistFailure>> {
        self.flusher.errors()
    }

    fn persist_snapshot(&self) {
        let snapshot = self.products.borrow().clone();
        match persist::encode(&snapshot) {
            Ok(payload) => self.flusher.enqueue(payload),
            Err(err) => {
                tracing::error!(error = %err, "failed to encode cart for persistence");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use basket_core::Price;
    use rust_decimal::Decimal;

    use super::*;
    use crate::error::CartError;
    use crate::persist::DecodeError;
    use crate::storage::{MemoryBackend, StorageError};

    fn item(id: &str, price: i64) -> NewLineItem {
        NewLineItem {
            id: ProductId::from(id),
            title: format!("Product {id}"),
            image_url: format!("https://cdn.example.com/{id}.png"),
            price: Price::new(Decimal::from(price)),
        }
    }

    fn quick_config() -> StoreConfig {
        StoreConfig {
            flush_retry_delay: Duration::from_millis(5),
            ..StoreConfig::default()
        }
    }

    /// Counts `set` calls so tests can assert no write was issued.
    #[derive(Default)]
    struct RecordingBackend {
        inner: MemoryBackend,
        sets: AtomicUsize,
    }

    #[async_trait]
    impl StorageBackend for RecordingBackend {
        async fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> std::result::Result<(), StorageError> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value).await
        }
    }

    /// Fails the first `failures` writes, then behaves like memory.
    struct FlakyBackend {
        inner: MemoryBackend,
        failures_left: AtomicU32,
    }

    impl FlakyBackend {
        fn new(failures: u32) -> Self {
            Self {
                inner: MemoryBackend::new(),
                failures_left: AtomicU32::new(failures),
            }
        }
    }

    #[async_trait]
    impl StorageBackend for FlakyBackend {
        async fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> std::result::Result<(), StorageError> {
            let remaining = self.failures_left.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures_left.store(remaining - 1, Ordering::SeqCst);
                return Err(StorageError::Backend("injected transient failure".into()));
            }
            self.inner.set(key, value).await
        }
    }

    /// Every operation fails.
    struct BrokenBackend;

    #[async_trait]
    impl StorageBackend for BrokenBackend {
        async fn get(&self, _key: &str) -> std::result::Result<Option<String>, StorageError> {
            Err(StorageError::Backend("storage unavailable".into()))
        }

        async fn set(&self, _key: &str, _value: String) -> std::result::Result<(), StorageError> {
            Err(StorageError::Backend("storage unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_add_merges_and_persists() {
        let backend = Arc::new(MemoryBackend::new());
        let store = CartStore::new(Arc::clone(&backend) as Arc<dyn StorageBackend>);

        store.add_to_cart(item("a", 10));
        store.add_to_cart(item("a", 10));
        store.sync().await;

        let products = store.products();
        assert_eq!(products.len(), 1);
        assert_eq!(products.get(&ProductId::from("a")).unwrap().quantity, 2);

        let raw = backend.get(storage_keys::PRODUCTS).await.unwrap().unwrap();
        assert_eq!(persist::decode(&raw).unwrap(), products);
    }

    #[tokio::test]
    async fn test_increment_missing_issues_no_write() {
        let backend = Arc::new(RecordingBackend::default());
        let store = CartStore::new(Arc::clone(&backend) as Arc<dyn StorageBackend>);

        store.add_to_cart(item("a", 10));
        store.sync().await;
        let writes_before = backend.sets.load(Ordering::SeqCst);
        let products_before = store.products();

        store.increment(&ProductId::from("ghost"));
        store.decrement(&ProductId::from("ghost"));
        store.sync().await;

        assert_eq!(backend.sets.load(Ordering::SeqCst), writes_before);
        assert_eq!(store.products(), products_before);
    }

    #[tokio::test]
    async fn test_persisted_value_tracks_each_mutation() {
        let backend = Arc::new(MemoryBackend::new());
        let store = CartStore::new(Arc::clone(&backend) as Arc<dyn StorageBackend>);

        store.add_to_cart(item("a", 10));
        store.increment(&ProductId::from("a"));
        store.decrement(&ProductId::from("a"));
        store.sync().await;

        let raw = backend.get(storage_keys::PRODUCTS).await.unwrap().unwrap();
        let persisted = persist::decode(&raw).unwrap();
        assert_eq!(persisted, store.products());
        assert_eq!(persisted.get(&ProductId::from("a")).unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_load_absent_yields_empty_cart() {
        let store = CartStore::new(Arc::new(MemoryBackend::new()));
        store.load().await.unwrap();
        assert!(store.products().is_empty());
    }

    #[tokio::test]
    async fn test_load_restores_persisted_cart() {
        let backend = Arc::new(MemoryBackend::new());

        let first = CartStore::new(Arc::clone(&backend) as Arc<dyn StorageBackend>);
        first.add_to_cart(item("a", 10));
        first.add_to_cart(item("b", 25));
        first.sync().await;
        let expected = first.products();
        drop(first);

        let second = CartStore::new(backend);
        second.load().await.unwrap();
        assert_eq!(second.products(), expected);
    }

    #[tokio::test]
    async fn test_load_accepts_legacy_bare_array() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set(
                storage_keys::PRODUCTS,
                r#"[{"id":"a","title":"T","image_url":"u","price":10.0,"quantity":3}]"#.to_string(),
            )
            .await
            .unwrap();

        let store = CartStore::new(backend);
        store.load().await.unwrap();
        assert_eq!(store.products().get(&ProductId::from("a")).unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_load_rejects_unsupported_schema_version() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set(
                storage_keys::PRODUCTS,
                r#"{"schema_version":99,"products":[]}"#.to_string(),
            )
            .await
            .unwrap();

        let store = CartStore::new(backend);
        let err = store.load().await.unwrap_err();
        assert!(matches!(
            err,
            CartError::Decode(DecodeError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[tokio::test]
    async fn test_load_surfaces_storage_error_and_stays_usable() {
        let store = CartStore::new(Arc::new(BrokenBackend));

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, CartError::Storage(_)));

        // The in-memory cart still works after a failed load.
        store.add_to_cart(item("a", 10));
        assert_eq!(store.products().len(), 1);
    }

    #[tokio::test]
    async fn test_subscriber_notified_even_when_persistence_fails() {
        let store = CartStore::with_config(Arc::new(BrokenBackend), &quick_config());
        let mut rx = store.subscribe();

        store.add_to_cart(item("a", 10));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);
    }

    #[tokio::test]
    async fn test_flaky_backend_recovers_within_retries() {
        let backend = Arc::new(FlakyBackend::new(2));
        let store =
            CartStore::with_config(Arc::clone(&backend) as Arc<dyn StorageBackend>, &quick_config());

        store.add_to_cart(item("a", 10));
        store.sync().await;

        let raw = backend.get(storage_keys::PRODUCTS).await.unwrap().unwrap();
        assert_eq!(persist::decode(&raw).unwrap(), store.products());
        assert_eq!(*store.last_persist_error().borrow(), None);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_failure() {
        let config = StoreConfig {
            flush_retries: 2,
            flush_retry_delay: Duration::from_millis(5),
            ..StoreConfig::default()
        };
        let store = CartStore::with_config(Arc::new(BrokenBackend), &config);

        store.add_to_cart(item("a", 10));
        store.sync().await;

        let failure = store.last_persist_error().borrow().clone().unwrap();
        assert_eq!(failure.attempts, 2);
        assert!(failure.message.contains("storage unavailable"));

        // The in-memory cart is not poisoned by the failed write.
        assert_eq!(store.products().len(), 1);
    }

    #[tokio::test]
    async fn test_queued_snapshots_coalesce_to_latest() {
        let backend = Arc::new(MemoryBackend::new());
        let store = CartStore::new(Arc::clone(&backend) as Arc<dyn StorageBackend>);

        for _ in 0..5 {
            store.add_to_cart(item("a", 10));
        }
        store.sync().await;

        let raw = backend.get(storage_keys::PRODUCTS).await.unwrap().unwrap();
        let persisted = persist::decode(&raw).unwrap();
        assert_eq!(persisted.get(&ProductId::from("a")).unwrap().quantity, 5);
    }
}
