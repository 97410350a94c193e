use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use super::ClientApiError;
use super::Session;
use super::SessionConfig;
use crate::network::framed;

/// Configurable construction of a [`Session`].
///
/// Chain configuration methods before calling
/// [`connect()`](SessionBuilder::connect).
pub struct SessionBuilder {
    config: SessionConfig,
}

impl SessionBuilder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            config: SessionConfig::new(endpoint),
        }
    }

    pub fn connect_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Make `poll_updates` return [`PollOutcome::Idle`](crate::PollOutcome)
    /// after this long without a delivery, instead of blocking forever.
    pub fn idle_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.config.idle_timeout = Some(timeout);
        self
    }

    pub fn publish_secret(
        mut self,
        secret: impl Into<String>,
    ) -> Self {
        self.config.publish_secret = Some(secret.into());
        self
    }

    pub fn max_frame_bytes(
        mut self,
        limit: usize,
    ) -> Self {
        self.config.max_frame_bytes = limit;
        self
    }

    /// Establish the session.
    ///
    /// # Errors
    /// - [`ClientApiError::Timeout`] when the connect exceeds the limit
    /// - [`ClientApiError::Connection`] on network failure
    ///
    /// Not retried internally; the caller owns backoff policy.
    pub async fn connect(self) -> std::result::Result<Session, ClientApiError> {
        let stream = timeout(
            self.config.connect_timeout,
            TcpStream::connect(&self.config.endpoint),
        )
        .await
        .map_err(|_| ClientApiError::Timeout(self.config.connect_timeout))?
        .map_err(ClientApiError::Connection)?;

        debug!(endpoint = %self.config.endpoint, "session connected");
        let framed = framed(stream, self.config.max_frame_bytes);
        Ok(Session::new(framed, self.config))
    }
}
