//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub redis_url: String,
    /// 保留账号 `root` 的口令。
    pub mqtt_root_password: String,
    /// 保留账号 `plugin` 的口令。
    pub mqtt_plugin_password: String,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub topicmap_cache_ttl_seconds: u64,
    pub forward_ready_wait_seconds: u64,
    pub forward_confirm_timeout_seconds: u64,
    pub forward_qos: u8,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = read_required("TG_DATABASE_URL")?;
        let mqtt_root_password = read_required("TG_MQTT_ROOT_PASSWORD")?;
        let mqtt_plugin_password = read_required("TG_MQTT_PLUGIN_PASSWORD")?;
        let http_addr = env::var("TG_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8090".to_string());
        let redis_url =
            env::var("TG_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let mqtt_host = env::var("TG_MQTT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let mqtt_port = read_u16_with_default("TG_MQTT_PORT", 1883)?;
        let topicmap_cache_ttl_seconds =
            read_u64_with_default("TG_TOPICMAP_CACHE_TTL_SECONDS", 24 * 60 * 60)?;
        let forward_ready_wait_seconds = read_u64_with_default("TG_FORWARD_READY_WAIT_SECONDS", 10)?;
        let forward_confirm_timeout_seconds =
            read_u64_with_default("TG_FORWARD_CONFIRM_TIMEOUT_SECONDS", 5)?;
        let forward_qos = read_u8_with_default("TG_FORWARD_QOS", 1)?;
        if forward_qos > 2 {
            return Err(ConfigError::Invalid(
                "TG_FORWARD_QOS".to_string(),
                forward_qos.to_string(),
            ));
        }

        Ok(Self {
            http_addr,
            database_url,
            redis_url,
            mqtt_root_password,
            mqtt_plugin_password,
            mqtt_host,
            mqtt_port,
            topicmap_cache_ttl_seconds,
            forward_ready_wait_seconds,
            forward_confirm_timeout_seconds,
            forward_qos,
        })
    }
}

fn read_required(key: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key.to_string())),
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u8_with_default(key: &str, default: u8) -> Result<u8, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u8>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}
