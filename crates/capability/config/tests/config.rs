use iot_config::{AppConfig, ConfigError};
use std::collections::HashMap;

fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    AppConfig::from_source(|key| map.get(key).cloned())
}

#[test]
fn defaults_apply_when_env_empty() {
    let config = config_from(&[]).expect("config");
    assert_eq!(config.http_addr, "0.0.0.0:8000");
    assert_eq!(config.mqtt_port, 8883);
    assert_eq!(config.mqtt_keepalive_secs, 60);
    assert_eq!(config.mqtt_topic, "application/+/device/+/event/up");
    assert_eq!(config.mqtt_system_topic, "$SYS/#");
    assert_eq!(config.mqtt_reconnect_initial_ms, 1000);
    assert_eq!(config.mqtt_reconnect_max_ms, 60_000);
    assert!(config.ingest_enabled);
    assert!(config.store_timescale);
    assert!(!config.ingest_store_unknown_device);
    assert!(!config.auth_required);
    assert!(config.mqtt_username.is_none());
    assert_eq!(config.mqtt_max_packet_bytes, 256 * 1024);
}

#[test]
fn overrides_are_read() {
    let config = config_from(&[
        ("MQTT_BROKER", "broker.local"),
        ("MQTT_PORT", "1883"),
        ("MQTT_USER", "ingest"),
        ("MQTT_RECONNECT_INITIAL_MS", "250"),
        ("MQTT_RECONNECT_MAX_MS", "4000"),
        ("INGEST_STORE_UNKNOWN_DEVICE", "on"),
        ("AUTH_REQUIRED", "true"),
    ])
    .expect("config");
    assert_eq!(config.mqtt_broker, "broker.local");
    assert_eq!(config.mqtt_port, 1883);
    assert_eq!(config.mqtt_username.as_deref(), Some("ingest"));
    assert!(config.mqtt_password.is_none());
    assert_eq!(config.mqtt_reconnect_initial_ms, 250);
    assert_eq!(config.mqtt_reconnect_max_ms, 4000);
    assert!(config.ingest_store_unknown_device);
    assert!(config.auth_required);
}

#[test]
fn invalid_port_is_rejected() {
    let err = config_from(&[("MQTT_PORT", "not-a-port")]).expect_err("invalid");
    assert_eq!(err.to_string(), "invalid value for MQTT_PORT: not-a-port");
}

#[test]
fn backoff_bounds_are_validated() {
    assert!(config_from(&[("MQTT_RECONNECT_INITIAL_MS", "0")]).is_err());
    assert!(
        config_from(&[
            ("MQTT_RECONNECT_INITIAL_MS", "5000"),
            ("MQTT_RECONNECT_MAX_MS", "1000"),
        ])
        .is_err()
    );
}

#[test]
fn qos_above_two_is_rejected() {
    assert!(config_from(&[("MQTT_QOS", "3")]).is_err());
}

#[test]
fn malformed_bool_is_rejected() {
    let err = config_from(&[("INGEST_ENABLED", "ture")]).expect_err("invalid");
    assert_eq!(err.to_string(), "invalid value for INGEST_ENABLED: ture");
    assert!(config_from(&[("STORE_TIMESCALE", "maybe")]).is_err());
}

#[test]
fn falsy_bool_values_are_accepted() {
    let config = config_from(&[
        ("INGEST_ENABLED", "0"),
        ("STORE_TIMESCALE", "off"),
        ("AUTH_REQUIRED", "No"),
    ])
    .expect("config");
    assert!(!config.ingest_enabled);
    assert!(!config.store_timescale);
    assert!(!config.auth_required);
}

#[test]
fn passwords_keep_surrounding_whitespace() {
    let config = config_from(&[
        ("MQTT_USER", "ingest"),
        ("MQTT_PASSWORD", " secret "),
        ("AUTH_PASSWORD", "pa ss "),
    ])
    .expect("config");
    assert_eq!(config.mqtt_password.as_deref(), Some(" secret "));
    assert_eq!(config.auth_password, "pa ss ");
}

#[test]
fn max_packet_size_is_configurable() {
    let config = config_from(&[("MQTT_MAX_PACKET_BYTES", "1048576")]).expect("config");
    assert_eq!(config.mqtt_max_packet_bytes, 1_048_576);
    assert!(config_from(&[("MQTT_MAX_PACKET_BYTES", "0")]).is_err());
}

#[test]
fn load_config_from_env() {
    // Rust 2024 中 set_var 需要显式标注 unsafe（测试进程内可控）。
    unsafe {
        std::env::set_var("HTTP_ADDR", "127.0.0.1:8081");
    }
    let config = AppConfig::from_env().expect("config");
    assert_eq!(config.http_addr, "127.0.0.1:8081");
}
