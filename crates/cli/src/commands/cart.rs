//! Cart commands.
//!
//! Each command runs against an initialized store and writes its report to
//! the given writer. Mutating commands fail if the cart could not be saved,
//! since the in-memory state dies with the process.
//!
//! # Environment Variables
//!
//! - `CART_STORAGE_DIR` - Directory holding the cart file
//! - `CART_STORAGE_KEY` - Name of the cart file (without `.json`)
//! - `CART_CURRENCY` - Currency used for totals

use std::io::Write;

use rust_decimal::Decimal;
use storefront_cart::{CartStore, DurableStorage, codec};
use storefront_cart_core::{Product, ProductId};
use thiserror::Error;
use tracing::info;

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// Writing the report failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// Serializing the report failed.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The cart changed in memory but could not be written to storage.
    #[error("Cart could not be saved; see the log for the storage error")]
    NotSaved,
}

/// Build the product snapshot passed to `add`.
pub fn product_from_args(
    id: ProductId,
    name: String,
    price: Decimal,
    image: Option<String>,
    vendor: Option<String>,
) -> Product {
    Product {
        id,
        name,
        price,
        image,
        vendor_name: vendor,
    }
}

/// Print the cart as a table, or as the stored JSON record.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn show<S: DurableStorage>(
    store: &CartStore<S>,
    json: bool,
    out: &mut impl Write,
) -> Result<(), CartCommandError> {
    if json {
        writeln!(out, "{}", codec::encode(store.items())?)?;
        return Ok(());
    }

    let summary = store.summary();
    if summary.items.is_empty() {
        writeln!(out, "Cart is empty")?;
        return Ok(());
    }

    for line in &summary.items {
        let vendor = line
            .vendor_name
            .as_deref()
            .map(|v| format!(" ({v})"))
            .unwrap_or_default();
        writeln!(
            out,
            "{:<12} {}{vendor}  {} x {} = {}",
            line.product_id, line.name, line.quantity, line.price, line.line_price
        )?;
    }
    writeln!(out, "Items: {}", summary.item_count)?;
    writeln!(out, "Subtotal: {}", summary.subtotal)?;
    Ok(())
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved or the output written.
pub fn add<S: DurableStorage>(
    store: &mut CartStore<S>,
    product: &Product,
    out: &mut impl Write,
) -> Result<(), CartCommandError> {
    store.add_item(product);
    ensure_saved(store)?;

    let quantity = store.get(product.id.as_str()).map_or(0, |line| line.quantity);
    info!(product_id = %product.id, quantity, "Added to cart");
    writeln!(out, "{} x {}", product.id, quantity)?;
    Ok(())
}

/// Remove a product.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved or the output written.
pub fn remove<S: DurableStorage>(
    store: &mut CartStore<S>,
    id: &ProductId,
    out: &mut impl Write,
) -> Result<(), CartCommandError> {
    if store.get(id.as_str()).is_none() {
        writeln!(out, "{id} is not in the cart")?;
        return Ok(());
    }

    store.remove_item(id.as_str());
    ensure_saved(store)?;

    info!(product_id = %id, "Removed from cart");
    writeln!(out, "Removed {id}")?;
    Ok(())
}

/// Set a product's quantity.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved or the output written.
pub fn update<S: DurableStorage>(
    store: &mut CartStore<S>,
    id: &ProductId,
    quantity: i64,
    out: &mut impl Write,
) -> Result<(), CartCommandError> {
    if store.get(id.as_str()).is_none() {
        writeln!(out, "{id} is not in the cart")?;
        return Ok(());
    }

    store.update_quantity(id.as_str(), quantity);
    ensure_saved(store)?;

    match store.get(id.as_str()) {
        Some(line) => writeln!(out, "{id} x {}", line.quantity)?,
        None => writeln!(out, "Removed {id}")?,
    }
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved or the output written.
pub fn clear<S: DurableStorage>(
    store: &mut CartStore<S>,
    out: &mut impl Write,
) -> Result<(), CartCommandError> {
    store.clear();
    ensure_saved(store)?;

    writeln!(out, "Cart cleared")?;
    Ok(())
}

/// Print the checkout payload as JSON and empty the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved or the output written.
pub fn checkout<S: DurableStorage>(
    store: &mut CartStore<S>,
    out: &mut impl Write,
) -> Result<(), CartCommandError> {
    let payload = serde_json::to_string_pretty(&store.checkout_lines())?;
    store.complete_checkout();
    ensure_saved(store)?;

    writeln!(out, "{payload}")?;
    Ok(())
}

fn ensure_saved<S: DurableStorage>(store: &CartStore<S>) -> Result<(), CartCommandError> {
    if store.is_persisted() {
        Ok(())
    } else {
        Err(CartCommandError::NotSaved)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storefront_cart::{CartConfig, ChangeBus, FileStorage, MemoryStorage};

    use super::*;

    fn product(id: &str, price: i64) -> Product {
        product_from_args(
            ProductId::parse(id).unwrap(),
            format!("Product {id}"),
            Decimal::from(price),
            None,
            Some("Acme".to_string()),
        )
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_show_empty_cart() {
        let store = CartStore::open(MemoryStorage::new(), ChangeBus::new(), &CartConfig::default());
        let mut buf = Vec::new();

        show(&store, false, &mut buf).unwrap();

        assert_eq!(output(buf), "Cart is empty\n");
    }

    #[test]
    fn test_show_table_and_json() {
        let mut store =
            CartStore::open(MemoryStorage::new(), ChangeBus::new(), &CartConfig::default());
        store.add_item(&product("p1", 10));
        store.add_item(&product("p2", 5));
        store.update_quantity("p1", 3);

        let mut buf = Vec::new();
        show(&store, false, &mut buf).unwrap();
        let table = output(buf);
        assert!(table.contains("Product p1 (Acme)  3 x $10.00 = $30.00"));
        assert!(table.contains("Items: 4"));
        assert!(table.ends_with("Subtotal: $35.00\n"));

        let mut buf = Vec::new();
        show(&store, true, &mut buf).unwrap();
        let record: serde_json::Value = serde_json::from_str(&output(buf)).unwrap();
        assert_eq!(record[0]["productId"], "p1");
        assert_eq!(record[0]["quantity"], 3);
    }

    #[test]
    fn test_add_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = CartConfig {
            storage_dir: dir.path().to_path_buf(),
            ..CartConfig::default()
        };

        let mut store = CartStore::open(
            FileStorage::new(&config.storage_dir),
            ChangeBus::new(),
            &config,
        );
        let mut buf = Vec::new();
        add(&mut store, &product("p1", 10), &mut buf).unwrap();
        add(&mut store, &product("p1", 10), &mut buf).unwrap();
        store.close();

        assert_eq!(output(buf), "p1 x 1\np1 x 2\n");

        let reopened = CartStore::open(
            FileStorage::new(&config.storage_dir),
            ChangeBus::new(),
            &config,
        );
        assert_eq!(reopened.total_items(), 2);
    }

    #[test]
    fn test_add_reports_unsaved_cart() {
        let mut store = CartStore::open(
            MemoryStorage::with_quota(4),
            ChangeBus::new(),
            &CartConfig::default(),
        );
        let mut buf = Vec::new();

        let err = add(&mut store, &product("p1", 10), &mut buf).unwrap_err();

        assert!(matches!(err, CartCommandError::NotSaved));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_update_and_remove_unknown_product() {
        let mut store =
            CartStore::open(MemoryStorage::new(), ChangeBus::new(), &CartConfig::default());
        let id = ProductId::parse("ghost").unwrap();
        let mut buf = Vec::new();

        update(&mut store, &id, 3, &mut buf).unwrap();
        remove(&mut store, &id, &mut buf).unwrap();

        assert_eq!(
            output(buf),
            "ghost is not in the cart\nghost is not in the cart\n"
        );
    }

    #[test]
    fn test_update_to_zero_removes() {
        let mut store =
            CartStore::open(MemoryStorage::new(), ChangeBus::new(), &CartConfig::default());
        store.add_item(&product("p1", 10));
        let id = ProductId::parse("p1").unwrap();
        let mut buf = Vec::new();

        update(&mut store, &id, 0, &mut buf).unwrap();

        assert_eq!(output(buf), "Removed p1\n");
        assert!(store.is_empty());
    }

    #[test]
    fn test_checkout_prints_payload_and_clears() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage.clone(), ChangeBus::new(), &CartConfig::default());
        store.add_item(&product("p1", 10));
        store.add_item(&product("p1", 10));
        let mut buf = Vec::new();

        checkout(&mut store, &mut buf).unwrap();

        let payload: serde_json::Value = serde_json::from_str(&output(buf)).unwrap();
        assert_eq!(
            payload,
            serde_json::json!([{"productId": "p1", "quantity": 2}])
        );
        assert!(store.is_empty());
        assert_eq!(storage.read("cart").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_clear() {
        let mut store =
            CartStore::open(MemoryStorage::new(), ChangeBus::new(), &CartConfig::default());
        store.add_item(&product("p1", 10));
        let mut buf = Vec::new();

        clear(&mut store, &mut buf).unwrap();

        assert_eq!(output(buf), "Cart cleared\n");
        assert_eq!(store.total_items(), 0);
    }
}
