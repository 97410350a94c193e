use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use nanoid::nanoid;
use tokio::sync::watch;
use tokio::sync::Notify;
use tracing::debug;

use crate::proto::UpdateMetadata;
use crate::Snapshot;

pub type SubscriptionId = String;

/// One (snapshot, metadata) unit posted to a subscription.
///
/// Exclusively owned by the receiving side once posted; the store's live
/// map keeps mutating without affecting it.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub snapshot: Arc<Snapshot>,
    pub metadata: UpdateMetadata,
}

/// Receiving half handed to the connection task that owns the subscription.
///
/// The channel holds only the latest delivery: if several revisions commit
/// before the consumer catches up, it observes one cumulative delivery
/// (level-triggered, no replay of intermediate states).
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    pub deliveries: watch::Receiver<Option<Delivery>>,
}

struct SubscriptionEntry {
    watch_fields: HashSet<String>,
    last_revision: u64,
    tx: watch::Sender<Option<Delivery>>,
}

/// State of one subscription as seen by a notifier pass.
pub(crate) struct SubscriptionState {
    pub id: SubscriptionId,
    pub watch_fields: HashSet<String>,
    pub last_revision: u64,
}

/// Tracks each connected client's watched field set and last-delivered
/// revision. Mutated concurrently by connection tasks (subscribe,
/// unsubscribe) and the notifier (watermark updates, posts).
#[derive(Default)]
pub struct SubscriptionRegistry {
    subs: DashMap<SubscriptionId, SubscriptionEntry>,
    wake: Notify,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a watch set. The watermark starts at `current_revision` so
    /// a new client is not flooded with historical changes. Wakes the
    /// notifier: commits that landed between snapshotting `current_revision`
    /// and this insert are still owed to the subscription.
    pub fn subscribe(
        &self,
        watch_fields: HashSet<String>,
        current_revision: u64,
    ) -> SubscriptionHandle {
        let id = nanoid!();
        let (tx, deliveries) = watch::channel(None);
        self.subs.insert(
            id.clone(),
            SubscriptionEntry {
                watch_fields,
                last_revision: current_revision,
                tx,
            },
        );
        self.wake.notify_one();
        debug!(subscription = %id, watermark = current_revision, "subscribed");
        SubscriptionHandle { id, deliveries }
    }

    /// Completes once a subscription has been registered since the previous
    /// call. A registration with no waiter is not lost; the permit is
    /// consumed by the next call.
    pub(crate) async fn registered(&self) {
        self.wake.notified().await;
    }

    /// Drop a subscription. Safe to call while a delivery is in flight for
    /// it; a post to a removed subscription is silently dropped.
    pub fn unsubscribe(
        &self,
        id: &str,
    ) {
        if self.subs.remove(id).is_some() {
            debug!(subscription = %id, "unsubscribed");
        }
    }

    /// Advance a watermark after delivery. Monotonic: a lower revision than
    /// the current watermark is ignored.
    pub fn update_watermark(
        &self,
        id: &str,
        revision: u64,
    ) {
        if let Some(mut entry) = self.subs.get_mut(id) {
            if revision > entry.last_revision {
                entry.last_revision = revision;
            }
        }
    }

    /// Post a delivery, replacing any unconsumed one. Returns `false` when
    /// the subscription is gone or its consumer hung up.
    pub fn post(
        &self,
        id: &str,
        delivery: Delivery,
    ) -> bool {
        match self.subs.get(id) {
            Some(entry) => entry.tx.send(Some(delivery)).is_ok(),
            None => false,
        }
    }

    /// Smallest live watermark, used to garbage-collect the change log.
    pub fn min_watermark(&self) -> Option<u64> {
        self.subs
            .iter()
            .map(|entry| entry.last_revision)
            .min()
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    pub(crate) fn states(&self) -> Vec<SubscriptionState> {
        self.subs
            .iter()
            .map(|entry| SubscriptionState {
                id: entry.key().clone(),
                watch_fields: entry.watch_fields.clone(),
                last_revision: entry.last_revision,
            })
            .collect()
    }
}
