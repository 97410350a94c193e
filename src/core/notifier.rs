//! Notifier
//!
//! Runs as one background task. Wakes on every committed revision and on
//! every subscription registration, computes which subscriptions are dirty
//! (their watched fields intersect the fields changed since their
//! watermark) and posts a fresh full snapshot to each.
//! Delivery failures are isolated per subscription; a dead consumer is
//! reaped without affecting the rest of the pass.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::Delivery;
use super::SubscriptionRegistry;
use crate::proto::UpdateMetadata;
use crate::ChangesSince;
use crate::RecordStore;

pub struct Notifier {
    store: Arc<RecordStore>,
    registry: Arc<SubscriptionRegistry>,
}

impl Notifier {
    pub fn new(
        store: Arc<RecordStore>,
        registry: Arc<SubscriptionRegistry>,
    ) -> Self {
        Self { store, registry }
    }

    /// Spawn the notification loop. Stops when the shutdown channel fires
    /// or the store is dropped.
    pub fn spawn(
        self,
        shutdown_rx: watch::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown_rx))
    }

    async fn run(
        self,
        mut shutdown_rx: watch::Receiver<()>,
    ) {
        let mut commits = self.store.subscribe_commits();
        info!("notifier started");
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("notifier stopping on shutdown signal");
                    break;
                }
                changed = commits.changed() => {
                    if changed.is_err() {
                        // Store dropped: nothing left to notify about
                        break;
                    }
                    self.run_pass();
                }
                // A subscription registered with a watermark behind the
                // current revision is owed a delivery even if nothing
                // commits again
                _ = self.registry.registered() => {
                    self.run_pass();
                }
            }
        }
    }

    /// One notification pass. Level-triggered: however many revisions
    /// committed since the last pass, each dirty subscription receives
    /// exactly one delivery carrying the cumulative latest state.
    pub fn run_pass(&self) {
        let snapshot = self.store.read_all();
        let current = snapshot.revision();
        let change_log = self.store.change_log();

        for sub in self.registry.states() {
            if sub.last_revision >= current {
                continue;
            }

            let changed_fields = match change_log.changed_fields_since(sub.last_revision) {
                ChangesSince::Complete(fields) => fields,
                ChangesSince::Truncated => {
                    // The log no longer reaches back to this watermark;
                    // assume every watched field may have changed. A full
                    // snapshot delivery is always safe.
                    warn!(
                        subscription = %sub.id,
                        watermark = sub.last_revision,
                        "change log truncated past watermark, forcing delivery"
                    );
                    sub.watch_fields.clone()
                }
            };

            let dirty = changed_fields
                .iter()
                .any(|field| sub.watch_fields.contains(field));
            if dirty {
                let delivery = Delivery {
                    snapshot: Arc::clone(&snapshot),
                    metadata: UpdateMetadata {
                        revision: current,
                        changed_fields,
                    },
                };
                if !self.registry.post(&sub.id, delivery) {
                    // Consumer hung up mid-flight: drop silently, reap
                    debug!(subscription = %sub.id, "delivery dropped, consumer gone");
                    self.registry.unsubscribe(&sub.id);
                    continue;
                }
                debug!(
                    subscription = %sub.id,
                    revision = current,
                    "delivery posted"
                );
            }

            // Clean subscriptions advance too: they observed (and need)
            // nothing from the skipped revisions.
            self.registry.update_watermark(&sub.id, current);
        }

        let horizon = self.registry.min_watermark().unwrap_or(current);
        change_log.prune_before(horizon);
    }
}
