//! Storefront Cart - Client-side cart store with durable persistence.
//!
//! The cart is a local cache of line items mirrored to a key-value store. It
//! is reconciled with the server cart at checkout by the caller.
//!
//! # Architecture
//!
//! - [`CartStore`] owns the line items and is constructed explicitly with a
//!   storage backend and a change bus; there is no global cart
//! - [`storage`] backends persist the whole collection as one JSON record
//! - [`events`] broadcast a payload-free change signal after each mutation
//!   so other stores sharing the storage can re-read it
//!
//! # Example
//!
//! ```
//! use rust_decimal::Decimal;
//! use storefront_cart::{CartConfig, CartStore, ChangeBus, MemoryStorage};
//! use storefront_cart_core::{Product, ProductId};
//!
//! let storage = MemoryStorage::new();
//! let mut cart = CartStore::open(storage, ChangeBus::new(), &CartConfig::default());
//!
//! let tee = Product::new(ProductId::parse("p1").unwrap(), "Tee", Decimal::from(10));
//! cart.add_item(&tee);
//! cart.add_item(&tee);
//!
//! assert_eq!(cart.total_items(), 2);
//! assert_eq!(cart.total_price(), Decimal::from(20));
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod codec;
pub mod config;
pub mod events;
pub mod storage;
pub mod store;
pub mod summary;

pub use codec::DecodeError;
pub use config::{CartConfig, ConfigError};
pub use events::{CartChanged, CartSubscription, ChangeBus};
pub use storage::{DurableStorage, FileStorage, MemoryStorage, StorageError};
pub use store::{CartStore, LoadOutcome};
pub use summary::{CartLineView, CartSummary, CheckoutLine};
