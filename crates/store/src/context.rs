//! Provider context for scoped access to the cart store.
//!
//! The cart is exposed to the rest of the application through an explicit
//! context object constructed once per session and passed by reference to
//! dependent components. Until a store is provided, the context is in an
//! explicit not-initialized state and every accessor rejects with a
//! descriptive error instead of handing out empty or default data.

use std::sync::{Arc, OnceLock};

use crate::error::{CartError, Result};
use crate::store::CartStore;

/// Session-scoped provider for the shared [`CartStore`].
///
/// # Example
///
/// ```rust,ignore
/// let context = CartContext::new();
///
/// // Accessing before provide() fails fast:
/// assert!(context.cart().is_err());
///
/// context.provide(Arc::new(CartStore::open(&config)))?;
/// context.cart()?.add_to_cart(item);
/// ```
#[derive(Default)]
pub struct CartContext {
    store: OnceLock<Arc<CartStore>>,
}

impl CartContext {
    /// Create a context in the not-initialized state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            store: OnceLock::new(),
        }
    }

    /// Install the session's cart store.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AlreadyProvided`] if a store was already
    /// installed; a session has exactly one cart.
    pub fn provide(&self, store: Arc<CartStore>) -> Result<()> {
        self.store
            .set(store)
            .map_err(|_| CartError::AlreadyProvided)
    }

    /// Access the cart store.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutsideProvider`] when called before
    /// [`provide`](Self::provide) - consumers outside an active provider
    /// scope must fail fast rather than silently see an empty cart.
    pub fn cart(&self) -> Result<&CartStore> {
        self.store
            .get()
            .map(Arc::as_ref)
            .ok_or(CartError::OutsideProvider)
    }

    /// Whether a store has been provided.
    #[must_use]
    pub fn is_provided(&self) -> bool {
        self.store.get().is_some()
    }
}
