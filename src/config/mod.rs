//! Configuration management for the synchronization service.
//!
//! Settings are loaded with priority:
//! 1. Default values (hardcoded)
//! 2. TOML config file (`config/udbsync.toml` unless overridden)
//! 3. Environment variables (`UDBSYNC_*`, highest priority)

mod consumer;
mod log;
mod server;

pub use consumer::*;
pub use log::*;
pub use server::*;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::Result;
use crate::Schema;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Listener and wire parameters
    #[serde(default)]
    pub server: ServerConfig,

    /// Field type declarations enforced by the record store
    #[serde(default)]
    pub schema: Schema,

    /// Reference consumer (authorized_keys rewriter) parameters
    #[serde(default)]
    pub consumer: ConsumerConfig,

    /// Daemon logging parameters
    #[serde(default)]
    pub log: LogConfig,
}

impl Settings {
    /// Load configuration, merging an optional TOML file with `UDBSYNC_*`
    /// environment overrides (e.g. `UDBSYNC_SERVER__BIND_ADDR`).
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(config_path.unwrap_or("config/udbsync")).required(false))
            .add_source(
                Environment::with_prefix("UDBSYNC")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod config_test;
