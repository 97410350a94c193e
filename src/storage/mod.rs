//! Storage module for the synchronization service.
//!
//! Holds the authoritative entity directory:
//! - [`RecordStore`] - entity map, revision counter and snapshot cache
//! - [`ChangeLog`] - per-revision changesets used by the notifier
//! - [`FieldValue`] / [`FieldType`] - typed field values and schema checks

mod change_log;
mod field_value;
mod record_store;

pub use change_log::*;
pub use field_value::*;
pub use record_store::*;
