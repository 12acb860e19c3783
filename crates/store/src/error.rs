//! Unified error handling for the cart store.
//!
//! Scope violations fail fast and visibly; storage and decode failures are
//! typed so callers can recover instead of crashing the host process.

use thiserror::Error;

use crate::persist::DecodeError;
use crate::storage::StorageError;

/// Errors surfaced by the cart store and its provider context.
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart API was accessed outside an active provider scope.
    #[error("cart accessed outside an active provider scope; call CartContext::provide before use")]
    OutsideProvider,

    /// The provider context was initialized twice in one session.
    #[error("cart provider already initialized for this session")]
    AlreadyProvided,

    /// Backend read or write failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Stored cart data could not be decoded.
    #[error("persisted cart could not be decoded: {0}")]
    Decode(#[from] DecodeError),
}

/// Result type alias for [`CartError`].
pub type Result<T> = std::result::Result<T, CartError>;
