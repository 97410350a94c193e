//! Reference consumers of the client library.

mod authorized_keys;

pub use authorized_keys::*;
