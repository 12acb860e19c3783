//! Persisted cart format.
//!
//! The cart is stored as a versioned envelope:
//!
//! ```json
//! { "schema_version": 1, "products": [ { "id": "...", ... } ] }
//! ```
//!
//! The version field exists so the format can evolve without silently
//! misreading old data. Earlier deployments stored the bare line-item array
//! with no envelope; the decoder still accepts that shape and treats it as
//! version 1 content.

use basket_core::Cart;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Newest schema version this build reads and the version it always writes.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors decoding a stored cart value.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The stored text is not valid cart JSON.
    #[error("invalid cart JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The envelope declares a version this build does not understand.
    #[error("unsupported cart schema version {found} (newest supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the stored envelope.
        found: u32,
        /// Newest version this build supports.
        supported: u32,
    },
}

#[derive(Serialize)]
struct Envelope<'a> {
    schema_version: u32,
    products: &'a Cart,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCart {
    Versioned { schema_version: u32, products: Cart },
    Legacy(Cart),
}

/// Encode a cart into its persisted envelope form.
///
/// # Errors
///
/// Returns `serde_json::Error` if serialization fails.
pub fn encode(cart: &Cart) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Envelope {
        schema_version: SCHEMA_VERSION,
        products: cart,
    })
}

/// Decode a stored value into a cart.
///
/// Accepts both the versioned envelope and the legacy bare array.
///
/// # Errors
///
/// Returns [`DecodeError`] if the text is not valid cart JSON or declares an
/// unsupported schema version.
pub fn decode(raw: &str) -> Result<Cart, DecodeError> {
    match serde_json::from_str::<StoredCart>(raw)? {
        StoredCart::Versioned {
            schema_version,
            products,
        } => {
            if schema_version == SCHEMA_VERSION {
                Ok(products)
            } else {
                Err(DecodeError::UnsupportedVersion {
                    found: schema_version,
                    supported: SCHEMA_VERSION,
                })
            }
        }
        StoredCart::Legacy(products) => Ok(products),
    }
}
