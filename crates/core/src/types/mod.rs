//! Core types for Basket.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod line_item;
pub mod price;

pub use id::ProductId;
pub use line_item::{LineItem, NewLineItem};
pub use price::Price;
