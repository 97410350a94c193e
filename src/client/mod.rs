//! Client library for the synchronization service.
//!
//! Provides the components a consumer needs:
//! - [`Session`] - one connection to the service
//! - [`SessionBuilder`] - configurable session construction
//! - [`ClientApiError`] - client-facing error surface
//!
//! # Basic Usage
//! ```no_run
//! use std::collections::HashSet;
//! use udbsync::Session;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut session = Session::builder("udbsync.internal:20020")
//!         .connect()
//!         .await
//!         .unwrap();
//!
//!     let watch = HashSet::from(["ssh_key".to_string()]);
//!     session
//!         .poll_updates(watch, |entities, metadata| {
//!             println!("revision {}: {} entities", metadata.revision, entities.len());
//!             Ok(())
//!         })
//!         .await
//!         .unwrap();
//! }
//! ```

mod builder;
mod config;
mod error;
mod session;

pub use builder::*;
pub use config::*;
pub use error::*;
pub use session::*;
