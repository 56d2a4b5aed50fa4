//! Serialization of the persisted cart record.
//!
//! The record is a JSON array of line items. There is no version field and
//! no migration: anything that does not decode to a valid cart is rejected
//! and the caller falls back to an empty cart.

use std::collections::HashSet;

use storefront_cart_core::{LineItem, checked_total};
use thiserror::Error;

/// Reasons a stored record cannot be used.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The value is not a JSON array of line items.
    #[error("malformed cart record: {0}")]
    Json(#[from] serde_json::Error),

    /// The value parsed but breaks a cart invariant.
    #[error("invalid cart record: {0}")]
    Invalid(String),
}

/// Serialize the full collection.
///
/// # Errors
///
/// Returns a `serde_json::Error` if a line item cannot be serialized.
pub fn encode(items: &[LineItem]) -> Result<String, serde_json::Error> {
    serde_json::to_string(items)
}

/// Deserialize and validate a stored collection.
///
/// # Errors
///
/// Returns [`DecodeError::Json`] for malformed input and
/// [`DecodeError::Invalid`] for a zero quantity, a repeated product id, or a
/// cart total too large to represent.
pub fn decode(raw: &str) -> Result<Vec<LineItem>, DecodeError> {
    let items: Vec<LineItem> = serde_json::from_str(raw)?;

    let mut seen = HashSet::with_capacity(items.len());
    for item in &items {
        if item.quantity == 0 {
            return Err(DecodeError::Invalid(format!(
                "product {} has quantity 0",
                item.product_id
            )));
        }
        if !seen.insert(item.product_id.as_str()) {
            return Err(DecodeError::Invalid(format!(
                "product {} appears more than once",
                item.product_id
            )));
        }
    }
    if checked_total(&items).is_none() {
        return Err(DecodeError::Invalid("cart total overflows".to_string()));
    }

    Ok(items)
}
