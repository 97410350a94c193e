//! Node
//!
//! Owns the assembled service: record store, subscription registry,
//! notifier task and TCP listener. `run` serves until the shutdown watch
//! channel fires, then joins the notifier.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::network::serve;
use crate::network::ServerContext;
use crate::NetworkError;
use crate::Notifier;
use crate::RecordStore;
use crate::Result;
use crate::Settings;
use crate::SubscriptionRegistry;

pub struct Node {
    settings: Settings,
    store: Arc<RecordStore>,
    registry: Arc<SubscriptionRegistry>,
    listener: Option<TcpListener>,
}

impl Node {
    pub(crate) fn new(
        settings: Settings,
        store: Arc<RecordStore>,
        registry: Arc<SubscriptionRegistry>,
    ) -> Self {
        Self {
            settings,
            store,
            registry,
            listener: None,
        }
    }

    /// Bind the listener ahead of [`run`](Node::run) and report the bound
    /// address. Binding to port 0 picks an ephemeral port.
    pub async fn bind(&mut self) -> Result<SocketAddr> {
        let addr = &self.settings.server.bind_addr;
        let listener = TcpListener::bind(addr).await.map_err(|e| NetworkError::Bind {
            addr: addr.clone(),
            source: e,
        })?;
        let local = listener.local_addr().map_err(NetworkError::Io)?;
        self.listener = Some(listener);
        Ok(local)
    }

    /// Serve until the shutdown channel fires. Spawns the notifier, runs
    /// the accept loop, then joins the notifier.
    pub async fn run(
        mut self,
        shutdown_rx: watch::Receiver<()>,
    ) -> Result<()> {
        if self.listener.is_none() {
            self.bind().await?;
        }
        let listener = self
            .listener
            .take()
            .ok_or_else(|| NetworkError::InvalidAddress("listener not bound".to_string()))?;

        let notifier = Notifier::new(Arc::clone(&self.store), Arc::clone(&self.registry));
        let notifier_handle = notifier.spawn(shutdown_rx.clone());

        let ctx = Arc::new(ServerContext {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            config: self.settings.server.clone(),
        });

        serve(listener, ctx, shutdown_rx).await?;
        notifier_handle.await?;
        info!("node stopped");
        Ok(())
    }
}
