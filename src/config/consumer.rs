use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// Parameters for the authorized_keys reference consumer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConsumerConfig {
    /// Destination credentials file, replaced atomically on every delivery.
    #[serde(default = "default_authorized_keys_path")]
    pub authorized_keys_path: PathBuf,

    /// Delay before reconnecting after a lost connection, in milliseconds.
    /// Reconnection policy belongs to the consumer, not the client library.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            authorized_keys_path: default_authorized_keys_path(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

fn default_authorized_keys_path() -> PathBuf {
    PathBuf::from("/root/.ssh/authorized_keys")
}

fn default_reconnect_delay_ms() -> u64 {
    2_000
}
