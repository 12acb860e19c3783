//! Line item types: one product entry in the cart with its quantity.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// One product entry in the cart.
///
/// `quantity` is signed: decrementing is unclamped, so 0 and negative
/// quantities are representable (see [`crate::cart::Cart::decrement`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product identifier; unique within a cart.
    pub id: ProductId,
    /// Product display title.
    pub title: String,
    /// URL of the product image.
    pub image_url: String,
    /// Unit price.
    pub price: Price,
    /// Number of units of this product in the cart.
    pub quantity: i64,
}

/// The payload for adding a product to the cart: a line item minus its
/// quantity. Quantity is assigned by the cart (1 on first add).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    /// Product identifier.
    pub id: ProductId,
    /// Product display title.
    pub title: String,
    /// URL of the product image.
    pub image_url: String,
    /// Unit price.
    pub price: Price,
}

impl NewLineItem {
    /// Convert into a full line item with the given quantity.
    #[must_use]
    pub fn into_line_item(self, quantity: i64) -> LineItem {
        LineItem {
            id: self.id,
            title: self.title,
            image_url: self.image_url,
            price: self.price,
            quantity,
        }
    }
}
