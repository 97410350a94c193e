use std::time::Duration;

use crate::proto::ErrorCode;

/// Client-facing error surface.
///
/// Connection-level failures are surfaced to the caller rather than retried
/// internally; the consuming process owns its reconnection policy.
#[derive(Debug, thiserror::Error)]
pub enum ClientApiError {
    /// Could not reach, or lost, the service
    #[error("Connection to the synchronization service failed: {0}")]
    Connection(#[source] std::io::Error),

    /// Connect attempt exceeded the configured timeout
    #[error("Connection timeout after {0:?}")]
    Timeout(Duration),

    /// Service closed the connection
    #[error("Connection closed by the service")]
    ConnectionClosed,

    /// Unexpected message for the session's current state
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// Service-reported rejection (bad secret, schema violation, ...)
    #[error("Request rejected ({code:?}): {message}")]
    Rejected { code: ErrorCode, message: String },

    /// Wire encoding failures
    #[error("Serialization failed: {0}")]
    Serialization(#[from] bincode::Error),
}

impl ClientApiError {
    /// Whether reconnecting could plausibly help.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ClientApiError::Connection(_)
                | ClientApiError::Timeout(_)
                | ClientApiError::ConnectionClosed
        )
    }
}
