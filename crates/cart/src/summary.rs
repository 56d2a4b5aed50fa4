//! Display and checkout views of a cart.

use rust_decimal::Decimal;
use serde::Serialize;
use storefront_cart_core::{CurrencyCode, LineItem, Money, ProductId};

/// Line display data for presentation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub vendor_name: Option<String>,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data for presentation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: u64,
}

impl CartSummary {
    /// Create an empty cart summary.
    #[must_use]
    pub fn empty(currency: CurrencyCode) -> Self {
        Self {
            items: Vec::new(),
            subtotal: Money::zero(currency).display(),
            item_count: 0,
        }
    }

    /// Build a summary from line items, formatting amounts in `currency`.
    #[must_use]
    pub fn from_items(items: &[LineItem], currency: CurrencyCode) -> Self {
        let format = |amount: Decimal| Money::new(amount, currency).display();

        Self {
            items: items
                .iter()
                .map(|item| CartLineView {
                    product_id: item.product_id.to_string(),
                    name: item.name.clone(),
                    vendor_name: item.vendor_name.clone(),
                    image: item.image.clone(),
                    quantity: item.quantity,
                    price: format(item.price),
                    line_price: format(item.line_total()),
                })
                .collect(),
            subtotal: format(
                items
                    .iter()
                    .map(LineItem::line_total)
                    .fold(Decimal::ZERO, Decimal::saturating_add),
            ),
            item_count: items.iter().map(|item| u64::from(item.quantity)).sum(),
        }
    }
}

/// One line of the payload handed to checkout for reconciliation with the
/// server cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    /// Product to purchase.
    pub product_id: ProductId,
    /// Quantity to purchase.
    pub quantity: u32,
}

impl From<&LineItem> for CheckoutLine {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
        }
    }
}
