use std::time::Duration;

use crate::constants::DEFAULT_CONNECT_TIMEOUT_MS;
use crate::constants::DEFAULT_MAX_FRAME_BYTES;

/// Session parameters, set through [`SessionBuilder`](crate::SessionBuilder).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Service address (`host:port`).
    pub endpoint: String,

    /// Limit on the initial TCP connect.
    pub connect_timeout: Duration,

    /// Maximum time `poll_updates` waits for a delivery before returning
    /// control to the caller. `None` blocks indefinitely (cancellation is
    /// then signal-driven).
    pub idle_timeout: Option<Duration>,

    /// Shared secret attached to Publish/Remove requests.
    pub publish_secret: Option<String>,

    /// Upper bound for a single wire frame; must match the server side.
    pub max_frame_bytes: usize,
}

impl SessionConfig {
    pub(crate) fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            idle_timeout: None,
            publish_secret: None,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}
