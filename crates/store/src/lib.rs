//! Basket Store - Persistent shopping-cart state container.
//!
//! Holds the session's cart in memory, mirrors it into a pluggable
//! key-value storage backend on every mutation, and restores it from
//! storage on startup. Dependent components access the cart through a
//! session-scoped [`CartContext`] and react to changes through a
//! [`CartStore::subscribe`] watch channel.
//!
//! # Architecture
//!
//! - In-memory cart inside a `tokio::sync::watch` channel; mutation and
//!   subscriber notification are one atomic step
//! - Background flusher task mirrors committed state into storage with
//!   bounded retries; failures are logged and observable, never fatal
//! - Storage is an async key-value trait with filesystem and in-memory
//!   implementations
//! - Persisted values carry a schema version; legacy unversioned blobs are
//!   still read
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use basket_store::{CartContext, CartStore, StoreConfig};
//!
//! let config = StoreConfig::from_env()?;
//! let store = Arc::new(CartStore::open(&config));
//! store.load().await?;
//!
//! let context = CartContext::new();
//! context.provide(Arc::clone(&store))?;
//!
//! // Elsewhere in the application:
//! let cart = context.cart()?;
//! cart.add_to_cart(item);
//! let mut changes = cart.subscribe();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod context;
pub mod error;
pub mod persist;
pub mod storage;
pub mod store;

mod flush;

pub use config::{ConfigError, StoreConfig};
pub use context::CartContext;
pub use error::{CartError, Result};
pub use flush::PersistFailure;
pub use persist::DecodeError;
pub use storage::{FileBackend, MemoryBackend, StorageBackend, StorageError};
pub use store::{CartStore, storage_keys};
