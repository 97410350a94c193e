use std::sync::Arc;

use crate::ChangeLog;
use crate::Node;
use crate::RecordStore;
use crate::Settings;
use crate::SubscriptionRegistry;

/// Assembles a [`Node`] from loaded [`Settings`].
///
/// Construction order is leaf-first: change log, record store (owning the
/// log), subscription registry. The notifier task is spawned by
/// [`Node::run`].
pub struct NodeBuilder {
    settings: Settings,
}

impl NodeBuilder {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn build(self) -> Node {
        let change_log = Arc::new(ChangeLog::new());
        let store = Arc::new(RecordStore::new(
            self.settings.schema.clone(),
            change_log,
        ));
        let registry = Arc::new(SubscriptionRegistry::new());
        Node::new(self.settings, store, registry)
    }
}
