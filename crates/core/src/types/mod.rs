//! Core types for the storefront cart.
//!
//! This module provides type-safe wrappers for the cart's domain concepts.

pub mod id;
pub mod line_item;
pub mod price;

pub use id::{ProductId, ProductIdError};
pub use line_item::{LineItem, Product, checked_total};
pub use price::{CurrencyCode, CurrencyCodeError, Money};
