//! Storefront Cart Core - Shared cart domain types.
//!
//! This crate provides the types shared by the cart components:
//! - `storefront-cart` - The cart store, its storage backends and change bus
//! - `storefront-cart-cli` - Command-line access to a file-backed cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no
//! logging. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product ids, products, line items, and money

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
