//! Cart line items and the product snapshots they are built from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product as offered to the cart by the catalog.
///
/// The cart copies the display fields out of this at add-time so a line
/// stays displayable after the product changes or leaves the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Catalog id.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Current unit price.
    pub price: Decimal,
    /// Primary image URL.
    pub image: Option<String>,
    /// Name of the vendor selling the product.
    pub vendor_name: Option<String>,
}

impl Product {
    /// Create a product without image or vendor.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            image: None,
            vendor_name: None,
        }
    }

    /// Set the image URL.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Set the vendor name.
    #[must_use]
    pub fn with_vendor(mut self, vendor_name: impl Into<String>) -> Self {
        self.vendor_name = Some(vendor_name.into());
        self
    }
}

/// One product entry in the cart.
///
/// Serializes to the persisted record shape:
/// `{ productId, name, price, quantity, image?, vendorName? }` with `price`
/// as a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product id, unique within a cart.
    pub product_id: ProductId,
    /// Display name captured at add-time.
    pub name: String,
    /// Unit price captured at add-time.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Always at least 1 while stored in a cart.
    pub quantity: u32,
    /// Image URL captured at add-time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Vendor name captured at add-time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
}

impl LineItem {
    /// Snapshot a product into a new line with quantity 1.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity: 1,
            image: product.image.clone(),
            vendor_name: product.vendor_name.clone(),
        }
    }

    /// Unit price multiplied by quantity.
    ///
    /// Saturates at the `Decimal` bounds; see [`checked_line_total`](Self::checked_line_total).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }

    /// Unit price multiplied by quantity, or `None` if it overflows.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Sum of line totals, or `None` if any line or the sum overflows.
#[must_use]
pub fn checked_total<'a>(items: impl IntoIterator<Item = &'a LineItem>) -> Option<Decimal> {
    items
        .into_iter()
        .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.checked_line_total()?))
}

impl From<&Product> for LineItem {
    fn from(product: &Product) -> Self {
        Self::from_product(product)
    }
}
