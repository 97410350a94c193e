//! Connection handling for the synchronization server.
//!
//! One task per connection. Each task multiplexes three event sources:
//! inbound request frames, the connection's subscription delivery channel,
//! and the daemon shutdown signal. A connection owns at most one
//! subscription; it is removed on disconnect.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::SinkExt;
use futures::StreamExt;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::decode;
use super::encode;
use super::framed;
use super::FramedStream;
use crate::proto::ErrorCode;
use crate::proto::Request;
use crate::proto::Response;
use crate::proto::UpdateMetadata;
use crate::Delivery;
use crate::Error;
use crate::NetworkError;
use crate::RecordStore;
use crate::Result;
use crate::ServerConfig;
use crate::SubscriptionHandle;
use crate::SubscriptionRegistry;

/// Shared state handed to every connection task.
pub(crate) struct ServerContext {
    pub store: Arc<RecordStore>,
    pub registry: Arc<SubscriptionRegistry>,
    pub config: ServerConfig,
}

/// Accept loop. Runs until the shutdown channel fires.
pub(crate) async fn serve(
    listener: TcpListener,
    ctx: Arc<ServerContext>,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<()> {
    info!(addr = %listener.local_addr().map_err(NetworkError::Io)?, "listening");
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                info!("listener stopping on shutdown signal");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "accepted connection");
                        tokio::spawn(handle_connection(
                            stream,
                            peer,
                            Arc::clone(&ctx),
                            shutdown_rx.clone(),
                        ));
                    }
                    Err(e) => {
                        warn!("accept failed: {}", e);
                    }
                }
            }
        }
    }
    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    ctx: Arc<ServerContext>,
    mut shutdown_rx: watch::Receiver<()>,
) {
    let mut framed = framed(stream, ctx.config.max_frame_bytes);
    let mut subscription: Option<SubscriptionHandle> = None;

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,

            delivery = next_delivery(&mut subscription) => {
                match delivery {
                    Some(delivery) => {
                        let response = Response::Delivery {
                            entities: delivery.snapshot.entities().clone(),
                            metadata: delivery.metadata,
                        };
                        if send(&mut framed, &response).await.is_err() {
                            break;
                        }
                    }
                    // Subscription reaped server-side; stop polling it
                    None => subscription = None,
                }
            }

            frame = framed.next() => {
                match frame {
                    None => break,
                    Some(Err(e)) => {
                        warn!(%peer, "frame read failed: {}", e);
                        break;
                    }
                    Some(Ok(payload)) => {
                        let request = match decode::<Request>(&payload) {
                            Ok(request) => request,
                            Err(e) => {
                                warn!(%peer, "undecodable request frame: {}", e);
                                break;
                            }
                        };
                        if !handle_request(request, &mut framed, &mut subscription, &ctx).await {
                            break;
                        }
                    }
                }
            }
        }
    }

    if let Some(handle) = subscription.take() {
        ctx.registry.unsubscribe(&handle.id);
    }
    debug!(%peer, "connection closed");
}

/// Wait for the next delivery on this connection's subscription, if any.
/// Resolves to `None` when the subscription was removed server-side;
/// pends forever while the connection has no subscription.
async fn next_delivery(subscription: &mut Option<SubscriptionHandle>) -> Option<Delivery> {
    let Some(handle) = subscription else {
        return std::future::pending().await;
    };
    loop {
        if handle.deliveries.changed().await.is_err() {
            return None;
        }
        let pending = handle.deliveries.borrow_and_update().clone();
        if let Some(delivery) = pending {
            return Some(delivery);
        }
    }
}

/// Process one request. Returns `false` when the connection should close.
async fn handle_request(
    request: Request,
    framed: &mut FramedStream,
    subscription: &mut Option<SubscriptionHandle>,
    ctx: &ServerContext,
) -> bool {
    match request {
        Request::Subscribe { watch } => {
            // A repeated Subscribe replaces the previous watch set
            if let Some(old) = subscription.take() {
                ctx.registry.unsubscribe(&old.id);
            }

            let snapshot = ctx.store.read_all();
            let handle = ctx.registry.subscribe(watch.clone(), snapshot.revision());
            let subscribed = Response::Subscribed {
                subscription_id: handle.id.clone(),
                revision: snapshot.revision(),
            };
            // New pollers receive the current state immediately; the
            // watermark already covers it, so no replay follows.
            let initial = Response::Delivery {
                entities: snapshot.entities().clone(),
                metadata: UpdateMetadata {
                    revision: snapshot.revision(),
                    changed_fields: watch,
                },
            };
            *subscription = Some(handle);

            send(framed, &subscribed).await.is_ok() && send(framed, &initial).await.is_ok()
        }

        Request::Publish {
            secret,
            entity,
            updates,
        } => {
            let response = if !ctx.config.authorizes(secret.as_deref()) {
                warn!(entity = %entity, "publish rejected: bad secret");
                Response::unauthorized()
            } else {
                match ctx.store.write(&entity, updates) {
                    Ok(revision) => Response::Published { revision },
                    Err(Error::Validation(e)) => Response::validation_error(&e),
                    Err(e) => {
                        error!(entity = %entity, "write failed: {}", e);
                        Response::Error {
                            code: ErrorCode::Internal,
                            message: "write failed".to_string(),
                        }
                    }
                }
            };
            send(framed, &response).await.is_ok()
        }

        Request::Remove { secret, entity } => {
            let response = if !ctx.config.authorizes(secret.as_deref()) {
                warn!(entity = %entity, "remove rejected: bad secret");
                Response::unauthorized()
            } else {
                match ctx.store.remove(&entity) {
                    Ok(revision) => Response::Removed { revision },
                    Err(e) => {
                        error!(entity = %entity, "remove failed: {}", e);
                        Response::Error {
                            code: ErrorCode::Internal,
                            message: "remove failed".to_string(),
                        }
                    }
                }
            };
            send(framed, &response).await.is_ok()
        }

        Request::Ping => send(framed, &Response::Pong).await.is_ok(),
    }
}

async fn send(
    framed: &mut FramedStream,
    response: &Response,
) -> Result<()> {
    let payload = encode(response)?;
    framed.send(payload).await.map_err(NetworkError::Io)?;
    Ok(())
}
