use std::collections::HashSet;
use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;
use crate::StorageError;

/// The (entity, field) pairs touched by one committed revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSet {
    pub revision: u64,
    pub pairs: Vec<(String, String)>,
}

impl ChangeSet {
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(_, field)| field.as_str())
    }
}

/// Result of a `changed_fields_since` query.
#[derive(Debug, Clone)]
pub enum ChangesSince {
    /// All changesets after the given revision are retained; the union of
    /// their field names follows.
    Complete(HashSet<String>),

    /// The log has been pruned past the given revision. The caller cannot
    /// know which fields changed and must assume all of them did.
    Truncated,
}

/// Ordered record of which fields changed at which revision.
///
/// Not an audit trail: entries older than the oldest live subscription
/// watermark are pruned after each notification pass.
#[derive(Debug, Default)]
pub struct ChangeLog {
    inner: Mutex<ChangeLogInner>,
}

#[derive(Debug, Default)]
struct ChangeLogInner {
    entries: VecDeque<ChangeSet>,

    /// Highest revision ever pruned. Queries at or below this point are
    /// answered with `Truncated`.
    pruned_through: u64,

    last_recorded: u64,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one changeset. Revisions must arrive in increasing order.
    pub fn record(
        &self,
        changeset: ChangeSet,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        if changeset.revision <= inner.last_recorded {
            return Err(StorageError::RevisionRegression {
                last: inner.last_recorded,
                recorded: changeset.revision,
            }
            .into());
        }
        inner.last_recorded = changeset.revision;
        inner.entries.push_back(changeset);
        Ok(())
    }

    /// All changesets strictly after `revision`, in revision order.
    pub fn changes_since(
        &self,
        revision: u64,
    ) -> Vec<ChangeSet> {
        let inner = self.inner.lock();
        inner
            .entries
            .iter()
            .filter(|cs| cs.revision > revision)
            .cloned()
            .collect()
    }

    /// Union of field names touched strictly after `revision`, or
    /// [`ChangesSince::Truncated`] when the log no longer reaches back that
    /// far.
    pub fn changed_fields_since(
        &self,
        revision: u64,
    ) -> ChangesSince {
        let inner = self.inner.lock();
        if revision < inner.pruned_through {
            return ChangesSince::Truncated;
        }
        let fields = inner
            .entries
            .iter()
            .filter(|cs| cs.revision > revision)
            .flat_map(|cs| cs.field_names().map(str::to_string))
            .collect();
        ChangesSince::Complete(fields)
    }

    /// Drop changesets with revision <= `revision`.
    pub fn prune_before(
        &self,
        revision: u64,
    ) {
        let mut inner = self.inner.lock();
        while inner
            .entries
            .front()
            .is_some_and(|cs| cs.revision <= revision)
        {
            inner.entries.pop_front();
        }
        if revision > inner.pruned_through {
            inner.pruned_through = revision;
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
