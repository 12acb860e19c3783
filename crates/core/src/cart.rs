//! The cart collection and its mutation rules.
//!
//! A [`Cart`] is an ordered sequence of [`LineItem`]s; order is the order in
//! which products were first added. All mutations are pure in-memory
//! operations - persistence and change notification live in `basket-store`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{LineItem, NewLineItem, ProductId};

/// The ordered collection of line items for the current session.
///
/// Serializes transparently as a JSON array of line items, which is the
/// shape stored by the persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add a product to the cart, merging by ID.
    ///
    /// If a line item with the same ID exists, its quantity is incremented
    /// by 1 and the rest of the payload is ignored. Otherwise a new line
    /// item is appended with quantity 1. Adding the same product twice is
    /// defined behavior, not an error.
    pub fn add(&mut self, item: NewLineItem) {
        match self.items.iter_mut().find(|line| line.id == item.id) {
            Some(line) => line.quantity += 1,
            None => self.items.push(item.into_line_item(1)),
        }
    }

    /// Increment the quantity of the line item with the given ID.
    ///
    /// Returns `true` if the cart changed. A missing ID is a no-op.
    pub fn increment(&mut self, id: &ProductId) -> bool {
        if let Some(line) = self.items.iter_mut().find(|line| &line.id == id) {
            line.quantity += 1;
            true
        } else {
            false
        }
    }

    /// Decrement the quantity of the line item with the given ID.
    ///
    /// Returns `true` if the cart changed. A missing ID is a no-op.
    ///
    /// The quantity is not floored: it may reach 0 or go negative. Whether
    /// such a line should be removed or clamped instead is an open product
    /// decision; until it is made, the line is kept as-is.
    pub fn decrement(&mut self, id: &ProductId) -> bool {
        if let Some(line) = self.items.iter_mut().find(|line| &line.id == id) {
            line.quantity -= 1;
            true
        } else {
            false
        }
    }

    /// The line item with the given ID, if present.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|line| &line.id == id)
    }

    /// All line items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart holds no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all line items.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// Sum of unit price times quantity across all line items.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(|line| line.price.amount() * Decimal::from(line.quantity))
            .sum()
    }
}

impl IntoIterator for Cart {
    type Item = LineItem;
    type IntoIter = std::vec::IntoIter<LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
