use serial_test::serial;

use crate::constants::DEFAULT_BIND_ADDR;
use crate::ServerConfig;
use crate::Settings;

#[test]
#[serial]
fn test_defaults_without_config_file() {
    let settings = Settings::load(Some("/nonexistent/udbsync")).unwrap();
    assert_eq!(settings.server.bind_addr, DEFAULT_BIND_ADDR);
    assert!(settings.server.publish_secret.is_none());
    assert!(!settings.schema.strict);
    assert_eq!(
        settings.consumer.authorized_keys_path,
        std::path::Path::new("/root/.ssh/authorized_keys")
    );
}

#[test]
#[serial]
fn test_environment_overrides_defaults() {
    std::env::set_var("UDBSYNC_SERVER__BIND_ADDR", "0.0.0.0:9999");
    let settings = Settings::load(Some("/nonexistent/udbsync")).unwrap();
    std::env::remove_var("UDBSYNC_SERVER__BIND_ADDR");

    assert_eq!(settings.server.bind_addr, "0.0.0.0:9999");
}

#[test]
fn test_publish_secret_authorization() {
    let mut config = ServerConfig::default();
    assert!(config.authorizes(None));
    assert!(config.authorizes(Some("anything")));

    config.publish_secret = Some("s3cret".to_string());
    assert!(config.authorizes(Some("s3cret")));
    assert!(!config.authorizes(Some("wrong")));
    assert!(!config.authorizes(None));
}
