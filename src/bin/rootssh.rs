//! udbsync-rootssh: keeps /root/.ssh/authorized_keys in sync with the
//! `ssh_key` field of every user in the directory.
//!
//! Reconnection policy lives here, not in the client library: on a lost
//! connection the consumer sleeps and dials again with the same watch set.

use std::collections::HashSet;
use std::time::Duration;

use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use udbsync::AuthorizedKeysWriter;
use udbsync::Error;
use udbsync::PollOutcome;
use udbsync::Result;
use udbsync::Session;
use udbsync::Settings;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1);
    let settings = Settings::load(config_path.as_deref())?;

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(layer).init();

    let cancel = CancellationToken::new();
    tokio::spawn(watch_signals(cancel.clone()));

    let writer = AuthorizedKeysWriter::new(settings.consumer.authorized_keys_path.clone());
    let endpoint = settings.server.bind_addr.clone();
    let reconnect_delay = Duration::from_millis(settings.consumer.reconnect_delay_ms);
    let watch: HashSet<String> = HashSet::from(["ssh_key".to_string()]);

    info!(endpoint = %endpoint, path = %writer.path().display(), "rootssh consumer starting");

    while !cancel.is_cancelled() {
        match Session::builder(endpoint.clone()).connect().await {
            Ok(mut session) => {
                let outcome = session
                    .poll_updates_until(
                        watch.clone(),
                        |entities, metadata| {
                            info!(revision = metadata.revision, "applying delivery");
                            writer.apply(entities)?;
                            Ok(())
                        },
                        cancel.clone(),
                    )
                    .await;

                match outcome {
                    Ok(PollOutcome::Cancelled) => break,
                    Ok(PollOutcome::Idle) => continue,
                    Err(e) if e.is_connection_error() => {
                        warn!("connection to udbsync lost: {}", e);
                    }
                    Err(e) => {
                        error!("poll failed: {}", e);
                    }
                }
            }
            Err(e) => {
                warn!("unable to reach udbsync: {}", e);
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(reconnect_delay) => {}
        }
    }

    info!("rootssh consumer stopped");
    Ok(())
}

async fn watch_signals(cancel: CancellationToken) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(|e| Error::Fatal(e.to_string()))?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| Error::Fatal(e.to_string()))?;
    tokio::select! {
        _ = sigint.recv() => info!("SIGINT detected."),
        _ = sigterm.recv() => info!("SIGTERM detected."),
    }
    cancel.cancel();
    Ok(())
}
