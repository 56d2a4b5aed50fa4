//! The cart store.
//!
//! [`CartStore`] is the single source of truth for the cart during a
//! session. It holds the line items in memory, writes the full collection to
//! durable storage after every mutation, and publishes a change signal.
//!
//! # Lifecycle
//!
//! 1. [`CartStore::new`] - construct with a storage backend and change bus
//! 2. [`CartStore::initialize`] - read the persisted record (never fails)
//! 3. mutate with [`add_item`](CartStore::add_item),
//!    [`remove_item`](CartStore::remove_item),
//!    [`update_quantity`](CartStore::update_quantity),
//!    [`clear`](CartStore::clear)
//! 4. [`CartStore::close`] - tear down; the stored record is kept
//!
//! # Failure semantics
//!
//! No operation returns an error. A record that cannot be decoded is
//! replaced by an empty cart. A failed write is logged and the in-memory
//! state stays authoritative for the rest of the session. Quantities are
//! capped so the cart total always fits in a `Decimal`.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use storefront_cart_core::{CurrencyCode, LineItem, Product, checked_total};
use tracing::{debug, error, info, instrument, warn};

use crate::codec;
use crate::config::CartConfig;
use crate::events::{CartSubscription, ChangeBus};
use crate::storage::DurableStorage;
use crate::summary::{CartSummary, CheckoutLine};

/// What [`CartStore::initialize`] or [`CartStore::reload`] found in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was stored under the key.
    Fresh,
    /// A valid record was loaded.
    Restored {
        /// Number of line items loaded.
        items: usize,
    },
    /// The record was unreadable; the cart starts empty.
    Recovered {
        /// Why the record was discarded.
        reason: String,
    },
}

/// Client-side cart backed by durable key-value storage.
pub struct CartStore<S> {
    storage: S,
    bus: ChangeBus,
    subscription: CartSubscription,
    key: String,
    currency: CurrencyCode,
    items: Vec<LineItem>,
    persisted: bool,
    warned_corrupt: bool,
    /// Our own signals still queued on `subscription`.
    own_signals: usize,
}

impl<S: DurableStorage> CartStore<S> {
    /// Construct an empty store. Storage is not read until
    /// [`initialize`](Self::initialize).
    #[must_use]
    pub fn new(storage: S, bus: ChangeBus, config: &CartConfig) -> Self {
        let subscription = bus.subscribe();
        Self {
            storage,
            bus,
            subscription,
            key: config.storage_key.clone(),
            currency: config.currency,
            items: Vec::new(),
            persisted: true,
            warned_corrupt: false,
            own_signals: 0,
        }
    }

    /// Construct and initialize in one step.
    #[must_use]
    pub fn open(storage: S, bus: ChangeBus, config: &CartConfig) -> Self {
        let mut store = Self::new(storage, bus, config);
        store.initialize();
        store
    }

    /// Load the persisted record, replacing in-memory state.
    ///
    /// Missing, malformed, or unreadable records yield an empty cart.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn initialize(&mut self) -> LoadOutcome {
        let outcome = self.load();
        info!(?outcome, items = self.items.len(), "Cart initialized");
        outcome
    }

    /// Re-read the persisted record, typically after a change signal from
    /// another store.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn reload(&mut self) -> LoadOutcome {
        let outcome = self.load();
        debug!(?outcome, items = self.items.len(), "Cart reloaded");
        outcome
    }

    /// Reload if another store published a change since our last write or
    /// poll.
    ///
    /// Returns `None` when nothing changed. Unpersisted local state is never
    /// replaced: after a failed write the in-memory cart is authoritative.
    pub fn poll_changes(&mut self) -> Option<LoadOutcome> {
        let pending = self.subscription.take_pending_count();
        if pending <= std::mem::take(&mut self.own_signals) {
            return None;
        }
        if !self.persisted {
            debug!(key = %self.key, "Ignoring cart change signal, local state unpersisted");
            return None;
        }
        Some(self.reload())
    }

    /// Tear down the store. The persisted record is left in storage.
    pub fn close(self) {
        debug!(key = %self.key, items = self.items.len(), "Cart store closed");
    }

    /// Add one unit of `product`.
    ///
    /// An existing line for the same product id gains one unit and keeps its
    /// original snapshot; otherwise a new line is appended with quantity 1.
    /// A unit that would push the cart total past `Decimal::MAX` is not
    /// added.
    #[instrument(skip(self, product), fields(key = %self.key, product_id = %product.id))]
    pub fn add_item(&mut self, product: &Product) -> &[LineItem] {
        let others = self.total_excluding(product.id.as_str());

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let quantity = affordable_quantity(others, item.price, item.quantity.saturating_add(1));
            if quantity == item.quantity {
                warn!(quantity, "Cart line at its limit, quantity unchanged");
                return &self.items;
            }
            item.quantity = quantity;
            debug!(quantity, "Incremented cart line");
        } else {
            if affordable_quantity(others, product.price, 1) == 0 {
                warn!(price = %product.price, "Cart total would overflow, product not added");
                return &self.items;
            }
            self.items.push(LineItem::from_product(product));
            debug!("Added cart line");
        }

        self.commit();
        &self.items
    }

    /// Remove the line for `product_id`. Unknown ids are a no-op.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn remove_item(&mut self, product_id: &str) {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);

        if self.items.len() == before {
            debug!("Product not in cart, nothing removed");
            return;
        }

        self.commit();
    }

    /// Set the quantity of the line for `product_id`.
    ///
    /// A quantity of zero or less removes the line. Unknown ids are a no-op.
    /// Quantities saturate at `u32::MAX` and are capped further if the cart
    /// total would overflow.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }

        let others = self.total_excluding(product_id);
        let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) else {
            debug!("Product not in cart, nothing updated");
            return;
        };
        let requested = u32::try_from(quantity).unwrap_or(u32::MAX);
        item.quantity = affordable_quantity(others, item.price, requested);
        if item.quantity < requested {
            warn!(requested, quantity = item.quantity, "Capped cart line quantity");
        }

        self.commit();
    }

    /// Remove every line.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn clear(&mut self) {
        self.items.clear();
        self.commit();
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// The line for `product_id`, if present.
    #[must_use]
    pub fn get(&self, product_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of unit price times quantity.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items
            .iter()
            .map(LineItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Whether every in-memory change has been written to storage.
    ///
    /// `false` only after a failed write, until a later write succeeds.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Display view of the cart in the configured currency.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::from_items(&self.items, self.currency)
    }

    /// Payload for reconciling with the server cart at checkout.
    #[must_use]
    pub fn checkout_lines(&self) -> Vec<CheckoutLine> {
        self.items.iter().map(CheckoutLine::from).collect()
    }

    /// Hand the cart to checkout: return the payload and clear the cart.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn complete_checkout(&mut self) -> Vec<CheckoutLine> {
        let lines = self.checkout_lines();
        info!(lines = lines.len(), total_items = self.total_items(), "Checkout completed");
        self.clear();
        lines
    }

    /// Total of every line except `product_id`'s.
    fn total_excluding(&self, product_id: &str) -> Decimal {
        checked_total(self.items.iter().filter(|item| item.product_id != product_id))
            .unwrap_or(Decimal::MAX)
    }

    fn load(&mut self) -> LoadOutcome {
        // Whatever is loaded, nothing in memory is left unsaved.
        self.persisted = true;

        let raw = match self.storage.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.items.clear();
                return LoadOutcome::Fresh;
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read cart, starting empty");
                self.items.clear();
                return LoadOutcome::Recovered {
                    reason: e.to_string(),
                };
            }
        };

        match codec::decode(&raw) {
            Ok(items) => {
                self.items = items;
                LoadOutcome::Restored {
                    items: self.items.len(),
                }
            }
            Err(e) => {
                if self.warned_corrupt {
                    debug!(key = %self.key, error = %e, "Stored cart still unreadable");
                } else {
                    warn!(key = %self.key, error = %e, "Discarding unreadable stored cart");
                    self.warned_corrupt = true;
                }
                self.items.clear();
                LoadOutcome::Recovered {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Write the full collection, then publish a change signal.
    fn commit(&mut self) {
        // Signals queued so far predate this write and are superseded by it.
        self.subscription.take_pending_count();

        self.persisted = match codec::encode(&self.items) {
            Ok(raw) => match self.storage.write(&self.key, &raw) {
                Ok(()) => true,
                Err(e) => {
                    error!(key = %self.key, error = %e, "Failed to persist cart");
                    false
                }
            },
            Err(e) => {
                error!(key = %self.key, error = %e, "Failed to serialize cart");
                false
            }
        };

        let notified = self.bus.publish();
        // Our subscription is among the receivers.
        self.own_signals = usize::from(notified > 0);
        debug!(
            items = self.items.len(),
            persisted = self.persisted,
            notified,
            "Cart committed"
        );
    }
}

/// Largest quantity up to `wanted` whose line total, added to `others`,
/// still fits in a `Decimal`.
fn affordable_quantity(others: Decimal, price: Decimal, wanted: u32) -> u32 {
    let fits = |quantity: u32| {
        price
            .checked_mul(Decimal::from(quantity))
            .and_then(|line| line.checked_add(others))
            .is_some()
    };
    if fits(wanted) {
        return wanted;
    }

    let headroom = if price.is_sign_negative() {
        others.checked_sub(Decimal::MIN)
    } else {
        Decimal::MAX.checked_sub(others)
    }
    .unwrap_or(Decimal::MAX);
    let mut quantity = headroom
        .checked_div(price.abs())
        .and_then(|q| q.floor().to_u32())
        .map_or(wanted, |q| q.min(wanted));

    // Division rounds; step down past any rounding error.
    while quantity > 0 && !fits(quantity) {
        quantity -= 1;
    }
    quantity
}

impl<S> std::fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("currency", &self.currency)
            .field("items", &self.items)
            .field("persisted", &self.persisted)
            .finish_non_exhaustive()
    }
}
