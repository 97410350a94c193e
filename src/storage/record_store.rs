//! RecordStore
//!
//! Single source of truth for the entity directory. Handles:
//! - Applying field updates atomically, one revision per write
//! - Enforcing the declared field schema
//! - Materializing immutable snapshots for delivery
//! - Signaling committed revisions to the notifier

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use super::ChangeLog;
use super::ChangeSet;
use super::EntityMap;
use super::FieldMap;
use super::Schema;
use crate::Result;
use crate::ValidationError;

/// Immutable point-in-time copy of the full entity map, tagged with the
/// revision it materializes. Shared by `Arc`; the store's live map keeps
/// mutating without affecting an already-delivered snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    revision: u64,
    entities: EntityMap,
}

impl Snapshot {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn entities(&self) -> &EntityMap {
        &self.entities
    }
}

/// Authoritative entity key -> field map store.
///
/// All mutation goes through [`write`](RecordStore::write) and
/// [`remove`](RecordStore::remove); concurrent writers are serialized so
/// field updates never interleave within one revision.
pub struct RecordStore {
    schema: Schema,
    change_log: Arc<ChangeLog>,
    inner: RwLock<StoreInner>,
    snapshot: ArcSwap<Snapshot>,
    commit_tx: watch::Sender<u64>,
}

#[derive(Default)]
struct StoreInner {
    entities: EntityMap,
    revision: u64,
}

impl RecordStore {
    pub fn new(
        schema: Schema,
        change_log: Arc<ChangeLog>,
    ) -> Self {
        let (commit_tx, _) = watch::channel(0);
        Self {
            schema,
            change_log,
            inner: RwLock::new(StoreInner::default()),
            snapshot: ArcSwap::from_pointee(Snapshot {
                revision: 0,
                entities: EntityMap::new(),
            }),
            commit_tx,
        }
    }

    /// Apply `updates` to `entity_key` as one atomic revision.
    ///
    /// The entity is created on first write. Every value is validated
    /// against the schema before anything is applied; a failed validation
    /// leaves the store untouched.
    ///
    /// # Errors
    /// - [`ValidationError::EmptyUpdate`] for an empty update map
    /// - [`ValidationError::TypeMismatch`] / [`ValidationError::UndeclaredField`]
    ///   on schema violations
    pub fn write(
        &self,
        entity_key: &str,
        updates: FieldMap,
    ) -> Result<u64> {
        if updates.is_empty() {
            return Err(ValidationError::EmptyUpdate.into());
        }
        for (field, value) in &updates {
            self.schema.check(field, value)?;
        }

        let revision;
        {
            let mut inner = self.inner.write();
            revision = inner.revision + 1;

            let pairs = updates
                .keys()
                .map(|field| (entity_key.to_string(), field.clone()))
                .collect();

            // Log append first: a rejected changeset must leave the
            // revision counter and entity map untouched
            self.change_log.record(ChangeSet { revision, pairs })?;

            inner.revision = revision;
            inner
                .entities
                .entry(entity_key.to_string())
                .or_default()
                .extend(updates);
            self.refresh_snapshot(&inner);
        }

        debug!(entity = entity_key, revision, "committed write");
        let _ = self.commit_tx.send(revision);
        Ok(revision)
    }

    /// Remove an entity. The changeset records every field the entity
    /// carried. Returns `None` (and burns no revision) when the entity does
    /// not exist.
    pub fn remove(
        &self,
        entity_key: &str,
    ) -> Result<Option<u64>> {
        let revision;
        {
            let mut inner = self.inner.write();
            let Some(fields) = inner.entities.get(entity_key) else {
                return Ok(None);
            };
            revision = inner.revision + 1;

            let pairs = fields
                .keys()
                .map(|field| (entity_key.to_string(), field.clone()))
                .collect();

            // Same ordering as write(): log append before any mutation
            self.change_log.record(ChangeSet { revision, pairs })?;

            inner.revision = revision;
            inner.entities.remove(entity_key);
            self.refresh_snapshot(&inner);
        }

        debug!(entity = entity_key, revision, "removed entity");
        let _ = self.commit_tx.send(revision);
        Ok(Some(revision))
    }

    /// Fully-materialized current snapshot, safe to hand across component
    /// boundaries. Lock-free.
    pub fn read_all(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Current global revision.
    pub fn revision(&self) -> u64 {
        self.inner.read().revision
    }

    /// Receiver signaled with the revision of every committed mutation.
    pub fn subscribe_commits(&self) -> watch::Receiver<u64> {
        self.commit_tx.subscribe()
    }

    pub fn change_log(&self) -> &Arc<ChangeLog> {
        &self.change_log
    }

    // Rebuild the cached snapshot under the write lock so readers always
    // observe a snapshot consistent with the revision counter.
    fn refresh_snapshot(
        &self,
        inner: &StoreInner,
    ) {
        self.snapshot.store(Arc::new(Snapshot {
            revision: inner.revision,
            entities: inner.entities.clone(),
        }));
    }
}
