//! Session
//!
//! One connection to the synchronization service. A session either
//! publishes updates or polls for deliveries; `poll_updates` is the
//! consumer's main loop and only returns on idle timeout, cancellation or
//! connection loss.
//!
//! State machine: Disconnected -> Connecting -> Subscribed ->
//! (Waiting | Delivering) -> Subscribed -> ... -> Disconnected.

use std::collections::HashSet;

use futures::SinkExt;
use futures::StreamExt;
use bytes::Bytes;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use super::ClientApiError;
use super::SessionConfig;
use crate::network::FramedStream;
use crate::proto::Request;
use crate::proto::Response;
use crate::proto::UpdateMetadata;
use crate::EntityMap;
use crate::FieldMap;

/// Why a poll loop returned control to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Idle timeout elapsed with no delivery observed.
    Idle,

    /// The cancellation token fired.
    Cancelled,
}

/// Errors reported by a delivery callback. Logged and swallowed by the poll
/// loop; they never tear down the session.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

pub struct Session {
    framed: FramedStream,
    config: SessionConfig,
    subscription_id: Option<String>,
}

impl Session {
    /// Create a configured session builder.
    pub fn builder(endpoint: impl Into<String>) -> super::SessionBuilder {
        super::SessionBuilder::new(endpoint)
    }

    pub(crate) fn new(
        framed: FramedStream,
        config: SessionConfig,
    ) -> Self {
        Self {
            framed,
            config,
            subscription_id: None,
        }
    }

    /// Identifier assigned by the service after a successful subscribe.
    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription_id.as_deref()
    }

    /// Apply `updates` to `entity` as one revision on the service.
    pub async fn publish(
        &mut self,
        entity: &str,
        updates: FieldMap,
    ) -> std::result::Result<u64, ClientApiError> {
        self.send(&Request::Publish {
            secret: self.config.publish_secret.clone(),
            entity: entity.to_string(),
            updates,
        })
        .await?;

        match self.recv().await? {
            Response::Published { revision } => Ok(revision),
            Response::Error { code, message } => Err(ClientApiError::Rejected { code, message }),
            other => Err(ClientApiError::Protocol(format!(
                "expected Published, got {:?}",
                other
            ))),
        }
    }

    /// Remove an entity. `Ok(None)` when the entity did not exist.
    pub async fn remove(
        &mut self,
        entity: &str,
    ) -> std::result::Result<Option<u64>, ClientApiError> {
        self.send(&Request::Remove {
            secret: self.config.publish_secret.clone(),
            entity: entity.to_string(),
        })
        .await?;

        match self.recv().await? {
            Response::Removed { revision } => Ok(revision),
            Response::Error { code, message } => Err(ClientApiError::Rejected { code, message }),
            other => Err(ClientApiError::Protocol(format!(
                "expected Removed, got {:?}",
                other
            ))),
        }
    }

    /// Liveness probe.
    pub async fn ping(&mut self) -> std::result::Result<(), ClientApiError> {
        self.send(&Request::Ping).await?;
        match self.recv().await? {
            Response::Pong => Ok(()),
            other => Err(ClientApiError::Protocol(format!(
                "expected Pong, got {:?}",
                other
            ))),
        }
    }

    /// Register `watch` and loop forever, invoking `callback` with the full
    /// snapshot and metadata for every delivery (the current state is
    /// delivered immediately on subscribe). Callback invocations are
    /// serialized on the calling task and causally ordered; callback errors
    /// are logged and the loop continues.
    ///
    /// Returns only on the configured idle timeout or on connection loss.
    pub async fn poll_updates<F>(
        &mut self,
        watch: HashSet<String>,
        callback: F,
    ) -> std::result::Result<PollOutcome, ClientApiError>
    where
        F: FnMut(&EntityMap, &UpdateMetadata) -> std::result::Result<(), CallbackError>,
    {
        self.poll_inner(watch, callback, None).await
    }

    /// Like [`poll_updates`](Session::poll_updates), additionally returning
    /// [`PollOutcome::Cancelled`] when `cancel` fires. No delivery is handed
    /// to the callback after cancellation.
    pub async fn poll_updates_until<F>(
        &mut self,
        watch: HashSet<String>,
        callback: F,
        cancel: CancellationToken,
    ) -> std::result::Result<PollOutcome, ClientApiError>
    where
        F: FnMut(&EntityMap, &UpdateMetadata) -> std::result::Result<(), CallbackError>,
    {
        self.poll_inner(watch, callback, Some(cancel)).await
    }

    async fn poll_inner<F>(
        &mut self,
        watch: HashSet<String>,
        mut callback: F,
        cancel: Option<CancellationToken>,
    ) -> std::result::Result<PollOutcome, ClientApiError>
    where
        F: FnMut(&EntityMap, &UpdateMetadata) -> std::result::Result<(), CallbackError>,
    {
        self.send(&Request::Subscribe { watch }).await?;
        match self.recv().await? {
            Response::Subscribed {
                subscription_id,
                revision,
            } => {
                debug!(subscription = %subscription_id, revision, "subscribed");
                self.subscription_id = Some(subscription_id);
            }
            other => {
                return Err(ClientApiError::Protocol(format!(
                    "expected Subscribed, got {:?}",
                    other
                )))
            }
        }

        let idle = self.config.idle_timeout;
        loop {
            let next = async {
                match idle {
                    Some(limit) => match timeout(limit, self.recv()).await {
                        Ok(response) => response.map(Some),
                        Err(_) => Ok(None),
                    },
                    None => self.recv().await.map(Some),
                }
            };

            let response = tokio::select! {
                _ = wait_cancelled(&cancel) => return Ok(PollOutcome::Cancelled),
                response = next => match response? {
                    Some(response) => response,
                    None => return Ok(PollOutcome::Idle),
                },
            };

            match response {
                Response::Delivery { entities, metadata } => {
                    debug!(
                        revision = metadata.revision,
                        entities = entities.len(),
                        "delivery received"
                    );
                    if let Err(e) = callback(&entities, &metadata) {
                        warn!("update callback failed: {}", e);
                    }
                }
                Response::Pong => {}
                Response::Error { code, message } => {
                    return Err(ClientApiError::Rejected { code, message })
                }
                other => {
                    return Err(ClientApiError::Protocol(format!(
                        "unexpected message while polling: {:?}",
                        other
                    )))
                }
            }
        }
    }

    async fn send(
        &mut self,
        request: &Request,
    ) -> std::result::Result<(), ClientApiError> {
        let payload = bincode::serialize(request)?;
        self.framed
            .send(Bytes::from(payload))
            .await
            .map_err(ClientApiError::Connection)
    }

    async fn recv(&mut self) -> std::result::Result<Response, ClientApiError> {
        match self.framed.next().await {
            None => Err(ClientApiError::ConnectionClosed),
            Some(Err(e)) => Err(ClientApiError::Connection(e)),
            Some(Ok(payload)) => Ok(bincode::deserialize(&payload)?),
        }
    }
}

async fn wait_cancelled(cancel: &Option<CancellationToken>) {
    match cancel {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}
