use tokio::sync::watch;

use crate::NodeBuilder;
use crate::Settings;

fn ephemeral_settings() -> Settings {
    let mut settings = Settings::default();
    settings.server.bind_addr = "127.0.0.1:0".to_string();
    settings
}

#[tokio::test]
async fn test_bind_reports_ephemeral_port() {
    let mut node = NodeBuilder::new(ephemeral_settings()).build();
    let addr = node.bind().await.unwrap();
    assert_ne!(addr.port(), 0);
}

#[tokio::test]
async fn test_run_stops_on_shutdown_signal() {
    let mut node = NodeBuilder::new(ephemeral_settings()).build();
    node.bind().await.unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let server = tokio::spawn(node.run(shutdown_rx));

    shutdown_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_bind_failure_surfaces_as_error() {
    let mut settings = Settings::default();
    settings.server.bind_addr = "256.0.0.1:0".to_string();
    let mut node = NodeBuilder::new(settings).build();
    assert!(node.bind().await.is_err());
}
