//! Integration tests for the storefront cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-cart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `multi_tab` - Several stores sharing one storage and change bus
//! - `persistence` - File-backed carts across reopen, corruption recovery
//!
//! This library holds the shared fixtures.

#![cfg_attr(not(test), forbid(unsafe_code))]

use rust_decimal::Decimal;
use storefront_cart::{CartConfig, CartStore, ChangeBus, MemoryStorage};
use storefront_cart_core::{Product, ProductId};

/// One browser origin: a shared storage and change bus that any number of
/// tabs (stores) can be opened on.
#[derive(Debug, Clone, Default)]
pub struct Origin {
    pub storage: MemoryStorage,
    pub bus: ChangeBus,
    pub config: CartConfig,
}

impl Origin {
    /// Create an origin with empty storage and default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new tab: an initialized store on the shared storage and bus.
    #[must_use]
    pub fn open_tab(&self) -> CartStore<MemoryStorage> {
        CartStore::open(self.storage.clone(), self.bus.clone(), &self.config)
    }
}

/// Build a catalog product with a whole-unit price.
///
/// # Panics
///
/// Panics if `id` is blank.
#[must_use]
#[allow(clippy::expect_used)]
pub fn product(id: &str, price: i64) -> Product {
    Product::new(
        ProductId::parse(id).expect("fixture product id must not be blank"),
        format!("Product {id}"),
        Decimal::from(price),
    )
}
