use tg_config::{AppConfig, ConfigError};

// 环境变量是进程级共享状态，所有断言放在同一个测试里串行执行。
#[test]
fn load_config_from_env() {
    // Rust 2024 中 set_var 需要显式标注 unsafe（测试进程内可控）。
    unsafe {
        std::env::remove_var("TG_DATABASE_URL");
        std::env::set_var("TG_MQTT_ROOT_PASSWORD", "root-secret");
        std::env::set_var("TG_MQTT_PLUGIN_PASSWORD", "plugin-secret");
    }
    let err = AppConfig::from_env().expect_err("missing database url");
    assert!(matches!(err, ConfigError::Missing(key) if key == "TG_DATABASE_URL"));

    unsafe {
        std::env::set_var("TG_DATABASE_URL", "postgres://tg:tg@localhost:5432/tg");
        std::env::set_var("TG_HTTP_ADDR", "127.0.0.1:8091");
        std::env::set_var("TG_FORWARD_QOS", "0");
    }
    let config = AppConfig::from_env().expect("config");
    assert_eq!(config.http_addr, "127.0.0.1:8091");
    assert_eq!(config.mqtt_root_password, "root-secret");
    assert_eq!(config.topicmap_cache_ttl_seconds, 86_400);
    assert_eq!(config.forward_ready_wait_seconds, 10);
    assert_eq!(config.forward_confirm_timeout_seconds, 5);
    assert_eq!(config.forward_qos, 0);

    unsafe {
        std::env::set_var("TG_MQTT_PORT", "not-a-port");
    }
    let err = AppConfig::from_env().expect_err("invalid port");
    assert!(matches!(err, ConfigError::Invalid(key, _) if key == "TG_MQTT_PORT"));
    unsafe {
        std::env::remove_var("TG_MQTT_PORT");
    }
}
