//! Integration tests for several cart stores sharing one origin.
//!
//! Each store models a browser tab: same storage, same change bus, its own
//! in-memory copy. Notification is advisory and the last write wins.

use rust_decimal::Decimal;
use storefront_cart::{DurableStorage, LoadOutcome};
use storefront_cart_integration_tests::{Origin, product};

// =============================================================================
// Notification
// =============================================================================

#[test]
fn test_tab_sees_other_tab_after_poll() {
    let origin = Origin::new();
    let mut tab_a = origin.open_tab();
    let mut tab_b = origin.open_tab();

    tab_a.add_item(&product("p1", 10));
    tab_a.add_item(&product("p2", 5));

    // Without polling, tab B still holds its own copy.
    assert!(tab_b.is_empty());

    assert_eq!(tab_b.poll_changes(), Some(LoadOutcome::Restored { items: 2 }));
    assert_eq!(tab_b.total_price(), Decimal::from(15));
}

#[test]
fn test_external_subscriber_sees_every_mutation() {
    let origin = Origin::new();
    let mut listener = origin.bus.subscribe();
    let mut tab = origin.open_tab();

    tab.add_item(&product("p1", 10));
    assert!(listener.take_pending());

    tab.update_quantity("p1", 2);
    assert!(listener.take_pending());

    tab.remove_item("p1");
    assert!(listener.take_pending());

    tab.clear();
    assert!(listener.take_pending());

    // Unknown ids do not mutate and do not signal.
    tab.remove_item("p1");
    tab.update_quantity("p1", 4);
    assert!(!listener.take_pending());
}

#[tokio::test]
async fn test_async_listener_wakes_on_change() {
    let origin = Origin::new();
    let mut listener = origin.bus.subscribe();

    let writer = origin.clone();
    let handle = tokio::task::spawn_blocking(move || {
        let mut tab = writer.open_tab();
        tab.add_item(&product("p1", 10));
    });

    assert!(listener.changed().await);
    handle.await.unwrap();

    let reader = origin.open_tab();
    assert_eq!(reader.total_items(), 1);
}

// =============================================================================
// Last Write Wins
// =============================================================================

#[test]
fn test_concurrent_tabs_last_write_wins() {
    let origin = Origin::new();
    let mut tab_a = origin.open_tab();
    let mut tab_b = origin.open_tab();

    tab_a.add_item(&product("p1", 10));
    // Tab B writes without re-reading first, overwriting tab A's record.
    tab_b.add_item(&product("p2", 5));

    let fresh = origin.open_tab();
    let ids: Vec<&str> = fresh.items().iter().map(|i| i.product_id.as_str()).collect();
    assert_eq!(ids, ["p2"]);

    // Tab A keeps its in-memory copy until it reloads.
    assert!(tab_a.get("p1").is_some());
    assert_eq!(tab_a.poll_changes(), Some(LoadOutcome::Restored { items: 1 }));
    assert!(tab_a.get("p1").is_none());
}

#[test]
fn test_tab_that_reloads_before_writing_keeps_both_lines() {
    let origin = Origin::new();
    let mut tab_a = origin.open_tab();
    let mut tab_b = origin.open_tab();

    tab_a.add_item(&product("p1", 10));
    tab_b.poll_changes();
    tab_b.add_item(&product("p2", 5));

    let fresh = origin.open_tab();
    assert_eq!(fresh.len(), 2);
    assert_eq!(fresh.total_price(), Decimal::from(15));
}

#[test]
fn test_checkout_in_one_tab_empties_the_other_after_poll() {
    let origin = Origin::new();
    let mut tab_a = origin.open_tab();
    let mut tab_b = origin.open_tab();

    tab_a.add_item(&product("p1", 10));
    tab_b.poll_changes();
    assert_eq!(tab_b.total_items(), 1);

    let lines = tab_a.complete_checkout();
    assert_eq!(lines.len(), 1);

    assert_eq!(tab_b.poll_changes(), Some(LoadOutcome::Restored { items: 0 }));
    assert!(tab_b.is_empty());
}

// =============================================================================
// Storage Failures
// =============================================================================

#[test]
fn test_quota_failure_leaves_tab_authoritative() {
    let origin = Origin::new();
    let mut tab_a = origin.open_tab();
    tab_a.add_item(&product("p1", 10));

    origin.storage.set_quota(Some(16)).unwrap();
    tab_a.add_item(&product("p2", 5));

    assert!(!tab_a.is_persisted());
    assert_eq!(tab_a.len(), 2);

    // Another tab only sees the last successful write.
    let tab_b = origin.open_tab();
    assert_eq!(tab_b.len(), 1);

    // The stored record is the one from before the failed write.
    let raw = origin.storage.read("cart").unwrap().unwrap();
    assert!(!raw.contains("p2"));
}
