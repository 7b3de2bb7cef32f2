use crate::entry::DebugLogEntry;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tg_storage::{KvStore, StorageError};
use tracing::debug;

const DEFAULT_MAX_ITEMS: i64 = 1000;
/// 日志键在配置过期后额外保留的秒数。
const LOGS_GRACE_SECONDS: i64 = 10 * 60;

pub fn config_key(device_id: &str) -> String {
    format!("devdebug:cfg:{}", device_id)
}

pub fn logs_key(device_id: &str) -> String {
    format!("devdebug:logs:{}", device_id)
}

/// 时间源（测试中可替换）。
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// 设备调试配置；`expire_at` 为 Unix 秒，0 表示不过期。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub expire_at: i64,
    #[serde(default)]
    pub max_items: i64,
    #[serde(default)]
    pub payload_max_bytes: i64,
}

impl DebugConfig {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expire_at > 0 && now > self.expire_at
    }

    fn normalized(mut self) -> Self {
        if self.max_items <= 0 {
            self.max_items = DEFAULT_MAX_ITEMS;
        }
        if self.payload_max_bytes < 0 {
            self.payload_max_bytes = 0;
        }
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DebugLogError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(#[from] StorageError),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct DebugLogSink {
    kv: Arc<dyn KvStore>,
    clock: Clock,
}

impl DebugLogSink {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self::with_clock(kv, Arc::new(Utc::now))
    }

    pub fn with_clock(kv: Arc<dyn KvStore>, clock: Clock) -> Self {
        Self { kv, clock }
    }

    /// 读取生效中的配置；未配置、未开启或已过期返回 None。
    pub async fn get_config(&self, device_id: &str) -> Result<Option<DebugConfig>, DebugLogError> {
        if device_id.is_empty() {
            return Err(DebugLogError::Validation("empty device_id".to_string()));
        }
        let Some(raw) = self.kv.get(&config_key(device_id)).await? else {
            return Ok(None);
        };
        let config: DebugConfig = serde_json::from_str(&raw)?;
        if !config.enabled || config.is_expired((self.clock)().timestamp()) {
            return Ok(None);
        }
        Ok(Some(config.normalized()))
    }

    /// 写入配置（管理端与测试使用）。
    pub async fn set_config(&self, device_id: &str, config: &DebugConfig) -> Result<(), DebugLogError> {
        if device_id.is_empty() {
            return Err(DebugLogError::Validation("empty device_id".to_string()));
        }
        let raw = serde_json::to_string(config)?;
        self.kv.set(&config_key(device_id), &raw, None).await?;
        Ok(())
    }

    /// 追加一条日志；返回是否真正写入。
    pub async fn write(&self, device_id: &str, mut entry: DebugLogEntry) -> Result<bool, DebugLogError> {
        let Some(config) = self.get_config(device_id).await? else {
            return Ok(false);
        };
        let now = (self.clock)();
        entry.device_id = device_id.to_string();
        if entry.ts.is_empty() {
            entry.ts = now.to_rfc3339_opts(SecondsFormat::Nanos, true);
        }

        let limit = usize::try_from(config.payload_max_bytes).unwrap_or(0);
        if limit == 0 {
            entry.payload.clear();
        } else if entry.payload.len() > limit {
            let cut = floor_char_boundary(&entry.payload, limit);
            entry.payload.truncate(cut);
            entry.meta.insert("payload_truncated".to_string(), true.into());
        }

        let raw = serde_json::to_string(&entry)?;
        let ttl = if config.expire_at > 0 {
            let seconds = config
                .expire_at
                .saturating_sub(now.timestamp())
                .saturating_add(LOGS_GRACE_SECONDS);
            u64::try_from(seconds).ok().filter(|seconds| *seconds > 0)
        } else {
            None
        };
        let max_items = usize::try_from(config.max_items).unwrap_or(1);
        self.kv
            .push_capped(&logs_key(device_id), &raw, max_items, ttl)
            .await?;
        debug!(target: "tg.devdebug", device_id = %device_id, "debug_log_written");
        Ok(true)
    }

    /// 读取设备日志（新在前）；无法解析的条目被忽略。
    pub async fn entries(&self, device_id: &str) -> Result<Vec<DebugLogEntry>, DebugLogError> {
        let items = self.kv.list(&logs_key(device_id)).await?;
        Ok(items
            .iter()
            .filter_map(|raw| serde_json::from_str(raw).ok())
            .collect())
    }
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut cut = index.min(text.len());
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    cut
}
