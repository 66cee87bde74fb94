use std::fs;
use std::time::Duration;

use tempfile::tempdir;

use crate::config::{ClientConfig, ConfigError, ConfigFormat};
use crate::plugin_system::error::RegistryError;
use crate::plugin_system::traits::Partition;

#[test]
fn test_empty_json_uses_defaults() {
    let config = ClientConfig::parse_str("{}", ConfigFormat::Json).unwrap();
    assert_eq!(config, ClientConfig::default());
    assert_eq!(config.server.transport_port, 8011);
    assert_eq!(config.connect_timeout(), Duration::from_secs(30));
    assert_eq!(config.dir_mode().unwrap(), 0o700);
    assert_eq!(config.log_level_filter().unwrap(), log::LevelFilter::Info);
    assert!(config.plugin_set().unwrap().is_empty());
}

#[test]
fn test_json_overrides() {
    let data = r#"{
        "client_name": "field-unit-7",
        "server": { "host": "10.0.0.5", "transport_port": 9011 },
        "sites": { "mobile_port": 9000 },
        "plugins": { "core": ["core-status"], "optional": ["notice-board"] }
    }"#;
    let config = ClientConfig::parse_str(data, ConfigFormat::Json).unwrap();
    assert_eq!(config.client_name, "field-unit-7");
    assert_eq!(config.server.host, "10.0.0.5");
    assert_eq!(config.server.transport_port, 9011);
    // Untouched keys in a present section keep their defaults
    assert_eq!(config.server.peer_name, "outpost-server");
    assert_eq!(config.sites.mobile_port, 9000);
    assert_eq!(config.sites.desktop_port, 8002);

    let set = config.plugin_set().unwrap();
    assert_eq!(set.names(Partition::Core), &["core-status".to_string()][..]);
    assert_eq!(set.partition_of("notice-board"), Some(Partition::Optional));
}

#[cfg(feature = "yaml-config")]
#[test]
fn test_yaml_config() {
    let data = "
server:
  host: server.local
logging:
  level: debug
plugins:
  core: [alpha]
  optional: [beta, gamma]
";
    let config = ClientConfig::parse_str(data, ConfigFormat::Yaml).unwrap();
    assert_eq!(config.server.host, "server.local");
    assert_eq!(config.log_level_filter().unwrap(), log::LevelFilter::Debug);
    assert_eq!(config.plugins.optional, vec!["beta", "gamma"]);

    assert_eq!(ClientConfig::parse_str("", ConfigFormat::Yaml).unwrap(), ClientConfig::default());
}

#[cfg(feature = "toml-config")]
#[test]
fn test_toml_config() {
    let data = r#"
platform_version = "2.4.1"

[sites]
doc_port = 9004
bind_address = "127.0.0.1"

[paths]
dir_mode = "0o750"
"#;
    let config = ClientConfig::parse_str(data, ConfigFormat::Toml).unwrap();
    assert_eq!(config.platform_version, "2.4.1");
    assert_eq!(config.sites.doc_port, 9004);
    assert!(config.site_options().bind_address.is_loopback());
    assert_eq!(config.dir_mode().unwrap(), 0o750);
}

#[test]
fn test_overlapping_partitions_rejected() {
    let data = r#"{ "plugins": { "core": ["alpha"], "optional": ["alpha"] } }"#;
    let err = ClientConfig::parse_str(data, ConfigFormat::Json).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidPluginSet(RegistryError::DuplicateConfigured(ref name)) if name == "alpha"
    ));
}

#[test]
fn test_transport_endpoint_name_rejected_as_plugin() {
    for data in [
        r#"{ "plugins": { "core": ["vortex"] } }"#,
        r#"{ "plugins": { "core": ["alpha"], "optional": ["vortex"] } }"#,
    ] {
        let err = ClientConfig::parse_str(data, ConfigFormat::Json).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPluginSet(RegistryError::ReservedName(ref name)) if name == "vortex"
        ));
    }
}

#[test]
fn test_invalid_values_rejected() {
    let bad_mode = r#"{ "paths": { "dir_mode": "rwx" } }"#;
    assert!(matches!(
        ClientConfig::parse_str(bad_mode, ConfigFormat::Json),
        Err(ConfigError::InvalidValue { ref key, .. }) if key == "paths.dir_mode"
    ));

    let bad_level = r#"{ "logging": { "level": "loud" } }"#;
    assert!(matches!(
        ClientConfig::parse_str(bad_level, ConfigFormat::Json),
        Err(ConfigError::InvalidValue { ref key, .. }) if key == "logging.level"
    ));

    let zero_timeout = r#"{ "server": { "connect_timeout_secs": 0 } }"#;
    assert!(ClientConfig::parse_str(zero_timeout, ConfigFormat::Json).is_err());

    assert!(matches!(
        ClientConfig::parse_str("{ not json", ConfigFormat::Json),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_load_from_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("outpost.json");
    fs::write(&path, r#"{ "client_name": "from-disk" }"#).unwrap();

    let config = ClientConfig::load(&path).unwrap();
    assert_eq!(config.client_name, "from-disk");

    let missing = dir.path().join("missing.json");
    assert!(matches!(ClientConfig::load(&missing), Err(ConfigError::Io { .. })));

    let unknown = dir.path().join("outpost.ini");
    fs::write(&unknown, "client_name = x").unwrap();
    assert!(matches!(
        ClientConfig::load(&unknown),
        Err(ConfigError::UnsupportedFormat { .. })
    ));
}
