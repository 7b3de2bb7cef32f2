//! 映射规则读穿缓存。
//!
//! 键：`topicmap:up:<device_config_id>` / `topicmap:down:<device_config_id>`，
//! 值为启用规则快照（JSON）。规则增删改后由管理端显式调用 `invalidate`。

use crate::error::TopicMapError;
use crate::repository::MappingRepository;
use domain::{Direction, MappingRule};
use std::sync::Arc;
use tg_storage::KvStore;
use tracing::{debug, warn};

/// 快照保留时长（24h）。
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 24 * 60 * 60;

pub fn cache_key(direction: Direction, device_config_id: &str) -> String {
    format!("topicmap:{}:{}", direction, device_config_id)
}

#[derive(Clone)]
pub struct MappingCache {
    kv: Arc<dyn KvStore>,
    repository: MappingRepository,
    ttl_seconds: u64,
}

impl MappingCache {
    pub fn new(kv: Arc<dyn KvStore>, repository: MappingRepository) -> Self {
        Self::with_ttl(kv, repository, DEFAULT_CACHE_TTL_SECONDS)
    }

    pub fn with_ttl(kv: Arc<dyn KvStore>, repository: MappingRepository, ttl_seconds: u64) -> Self {
        Self {
            kv,
            repository,
            ttl_seconds: ttl_seconds.max(1),
        }
    }

    /// 读取规则快照；未命中时从仓库加载并回填。
    ///
    /// 缓存读取或反序列化失败时回退到仓库加载，不向调用方报错。
    pub async fn get(
        &self,
        device_config_id: &str,
        direction: Direction,
    ) -> Result<Vec<MappingRule>, TopicMapError> {
        if device_config_id.trim().is_empty() {
            return Err(TopicMapError::Validation(
                "device_config_id required".to_string(),
            ));
        }
        let key = cache_key(direction, device_config_id);
        match self.kv.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<MappingRule>>(&raw) {
                Ok(rules) => return Ok(rules),
                Err(err) => {
                    warn!(target: "tg.topicmap", key = %key, error = %err, "mapping_cache_corrupt")
                }
            },
            Ok(None) => {}
            Err(err) => {
                warn!(target: "tg.topicmap", key = %key, error = %err, "mapping_cache_read_failed")
            }
        }

        let rules = self
            .repository
            .load_enabled(device_config_id, direction)
            .await?;
        debug!(
            target: "tg.topicmap",
            device_config_id = %device_config_id,
            direction = %direction,
            rules = rules.len(),
            "mapping_cache_loaded"
        );
        match serde_json::to_string(&rules) {
            Ok(raw) => {
                if let Err(err) = self.kv.set(&key, &raw, Some(self.ttl_seconds)).await {
                    warn!(target: "tg.topicmap", key = %key, error = %err, "mapping_cache_write_failed");
                }
            }
            Err(err) => {
                warn!(target: "tg.topicmap", key = %key, error = %err, "mapping_cache_encode_failed")
            }
        }
        Ok(rules)
    }

    /// 清除某个设备配置两个方向的快照。
    pub async fn invalidate(&self, device_config_id: &str) -> Result<(), TopicMapError> {
        if device_config_id.trim().is_empty() {
            return Err(TopicMapError::Validation(
                "device_config_id required".to_string(),
            ));
        }
        let keys = [
            cache_key(Direction::Up, device_config_id),
            cache_key(Direction::Down, device_config_id),
        ];
        self.kv.delete(&keys).await?;
        debug!(target: "tg.topicmap", device_config_id = %device_config_id, "mapping_cache_invalidated");
        Ok(())
    }
}
