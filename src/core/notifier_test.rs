use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;

use crate::ChangeLog;
use crate::Delivery;
use crate::FieldValue;
use crate::Notifier;
use crate::RecordStore;
use crate::Schema;
use crate::SubscriptionHandle;
use crate::SubscriptionRegistry;

fn setup() -> (Arc<RecordStore>, Arc<SubscriptionRegistry>, Notifier) {
    let store = Arc::new(RecordStore::new(
        Schema::default(),
        Arc::new(ChangeLog::new()),
    ));
    let registry = Arc::new(SubscriptionRegistry::new());
    let notifier = Notifier::new(Arc::clone(&store), Arc::clone(&registry));
    (store, registry, notifier)
}

fn watch_set(fields: &[&str]) -> HashSet<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

fn write(
    store: &RecordStore,
    entity: &str,
    field: &str,
    value: &str,
) -> u64 {
    store
        .write(
            entity,
            HashMap::from([(field.to_string(), FieldValue::from(value))]),
        )
        .unwrap()
}

fn take_delivery(handle: &mut SubscriptionHandle) -> Option<Delivery> {
    // A watch channel retains its last value; only a fresh post counts.
    if !handle.deliveries.has_changed().unwrap() {
        return None;
    }
    handle.deliveries.borrow_and_update().clone()
}

#[test]
fn test_watched_field_write_delivers_exactly_once() {
    let (store, registry, notifier) = setup();
    let mut handle = registry.subscribe(watch_set(&["ssh_key"]), store.revision());

    write(&store, "u1", "ssh_key", "key-A");
    notifier.run_pass();

    let delivery = take_delivery(&mut handle).expect("expected a delivery");
    assert_eq!(delivery.metadata.revision, 1);
    assert!(delivery.metadata.changed_fields.contains("ssh_key"));
    assert_eq!(
        delivery.snapshot.entities()["u1"]["ssh_key"],
        FieldValue::from("key-A")
    );

    // No intervening write: the next pass must not deliver again
    notifier.run_pass();
    assert!(take_delivery(&mut handle).is_none());
}

#[test]
fn test_unrelated_field_write_produces_no_delivery() {
    let (store, registry, notifier) = setup();
    let mut handle = registry.subscribe(watch_set(&["ssh_key"]), store.revision());

    write(&store, "u1", "last_login", "2026-08-30");
    notifier.run_pass();

    assert!(take_delivery(&mut handle).is_none());
    // The clean subscription still advanced past the revision
    assert_eq!(registry.states()[0].last_revision, 1);
}

#[test]
fn test_multiple_commits_coalesce_into_one_cumulative_delivery() {
    let (store, registry, notifier) = setup();
    let mut handle = registry.subscribe(watch_set(&["ssh_key"]), store.revision());

    write(&store, "u1", "ssh_key", "key-A");
    write(&store, "u1", "ssh_key", "key-B");
    write(&store, "u2", "ssh_key", "key-C");
    notifier.run_pass();

    let delivery = take_delivery(&mut handle).expect("expected a delivery");
    assert_eq!(delivery.metadata.revision, 3);
    assert_eq!(
        delivery.snapshot.entities()["u1"]["ssh_key"],
        FieldValue::from("key-B")
    );

    // Only the cumulative state was posted, no intermediate replay
    assert!(!handle.deliveries.has_changed().unwrap());
}

#[test]
fn test_disjoint_watch_sets_are_independent() {
    let (store, registry, notifier) = setup();
    let mut ssh = registry.subscribe(watch_set(&["ssh_key"]), store.revision());
    let mut shell = registry.subscribe(watch_set(&["shell"]), store.revision());

    write(&store, "u1", "ssh_key", "key-A");
    notifier.run_pass();

    assert!(take_delivery(&mut ssh).is_some());
    assert!(take_delivery(&mut shell).is_none());
}

#[test]
fn test_dead_consumer_is_reaped_and_others_still_served() {
    let (store, registry, notifier) = setup();
    let dead = registry.subscribe(watch_set(&["ssh_key"]), store.revision());
    let mut live = registry.subscribe(watch_set(&["ssh_key"]), store.revision());

    drop(dead.deliveries);
    write(&store, "u1", "ssh_key", "key-A");
    notifier.run_pass();

    assert_eq!(registry.len(), 1);
    assert!(take_delivery(&mut live).is_some());
}

#[test]
fn test_pass_prunes_change_log_to_min_watermark() {
    let (store, registry, notifier) = setup();
    let _handle = registry.subscribe(watch_set(&["ssh_key"]), store.revision());

    write(&store, "u1", "ssh_key", "key-A");
    write(&store, "u1", "ssh_key", "key-B");
    notifier.run_pass();

    // Every live subscription has seen revision 2, nothing older is needed
    assert!(store.change_log().is_empty());
}

#[test]
fn test_truncated_log_forces_delivery_to_stale_watermark() {
    let (store, registry, notifier) = setup();

    write(&store, "u1", "ssh_key", "key-A");
    write(&store, "u1", "last_login", "yesterday");
    store.change_log().prune_before(2);

    // Watermark predates the retained log: which fields changed is unknown
    let mut handle = registry.subscribe(watch_set(&["ssh_key"]), 0);
    notifier.run_pass();

    let delivery = take_delivery(&mut handle).expect("expected forced delivery");
    assert_eq!(delivery.metadata.revision, 2);
    assert!(delivery.metadata.changed_fields.contains("ssh_key"));
}

#[tokio::test]
async fn test_late_subscription_is_served_without_further_commits() {
    let (store, registry, notifier) = setup();
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let task = notifier.spawn(shutdown_rx);

    // Commit before anyone subscribes and give the commit pass time to run
    write(&store, "u1", "ssh_key", "key-A");
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The watermark is behind the current revision; registration alone must
    // produce the owed delivery, with no further writes arriving
    let mut handle = registry.subscribe(watch_set(&["ssh_key"]), 0);
    timeout(Duration::from_secs(1), handle.deliveries.changed())
        .await
        .expect("registration must wake the notifier")
        .unwrap();

    // `changed()` already marked the value as seen; borrow it directly.
    let delivery = handle
        .deliveries
        .borrow_and_update()
        .clone()
        .expect("expected a delivery");
    assert_eq!(delivery.metadata.revision, 1);
    assert_eq!(
        delivery.snapshot.entities()["u1"]["ssh_key"],
        FieldValue::from("key-A")
    );

    shutdown_tx.send(()).unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_spawned_notifier_stops_on_shutdown_signal() {
    let (_store, _registry, notifier) = setup();
    let (shutdown_tx, shutdown_rx) = watch::channel(());

    let handle = notifier.spawn(shutdown_rx);
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();
}
