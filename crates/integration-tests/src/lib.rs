//! Integration tests for Basket.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p basket-integration-tests
//! ```
//!
//! Tests run the full public API (context, store, persistence) against a
//! real filesystem backend in a temporary directory; nothing external is
//! required.

use std::sync::Arc;
use std::time::Duration;

use basket_core::{NewLineItem, Price, ProductId};
use basket_store::{CartStore, StoreConfig};
use rust_decimal::Decimal;
use tempfile::TempDir;

/// A cart store over a file backend in a temporary directory, plus the
/// handles needed to simulate a process restart.
pub struct TestContext {
    /// Temp directory backing the store; removed on drop.
    dir: TempDir,
    /// Store configuration pointing at the temp directory.
    pub config: StoreConfig,
    /// The store under test.
    pub store: Arc<CartStore>,
}

impl TestContext {
    /// Create a fresh store over an empty temporary directory.
    pub async fn new() -> Self {
        init_tracing();

        let dir = TempDir::new().expect("failed to create temp dir");
        let config = StoreConfig {
            storage_dir: dir.path().to_path_buf(),
            flush_retries: 3,
            flush_retry_delay: Duration::from_millis(10),
        };

        let store = Arc::new(CartStore::open(&config));
        store.load().await.expect("failed to load empty cart");

        Self { dir, config, store }
    }

    /// Simulate a process restart: flush, drop the store, open a new one
    /// over the same directory, and restore it from storage.
    pub async fn reopen(&mut self) {
        self.store.sync().await;
        self.store = Arc::new(CartStore::open(&self.config));
        self.store.load().await.expect("failed to reload cart");
    }

    /// Path of the persisted cart file.
    #[must_use]
    pub fn cart_file(&self) -> std::path::PathBuf {
        self.dir.path().join("products.json")
    }
}

/// Build an add payload for a test product.
#[must_use]
pub fn line_item(id: &str, price: i64) -> NewLineItem {
    NewLineItem {
        id: ProductId::from(id),
        title: format!("Product {id}"),
        image_url: format!("https://cdn.example.com/{id}.png"),
        price: Price::new(Decimal::from(price)),
    }
}

/// Initialize test-visible logging once; later calls are no-ops.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "basket_store=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
