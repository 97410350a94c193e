use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// Daemon logging parameters.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LogConfig {
    /// Directory for the daemon log file. Logs go to stderr when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}
