//! 映射规则仓库：从持久化存储加载启用规则并按优先级排序。

use crate::error::TopicMapError;
use domain::{Direction, MappingRule};
use std::sync::Arc;
use tg_storage::MappingRuleStore;

#[derive(Clone)]
pub struct MappingRepository {
    store: Arc<dyn MappingRuleStore>,
}

impl MappingRepository {
    pub fn new(store: Arc<dyn MappingRuleStore>) -> Self {
        Self { store }
    }

    /// 加载启用规则，按 priority 升序；同优先级保持加载顺序。
    ///
    /// 没有规则时返回空列表而不是错误。
    pub async fn load_enabled(
        &self,
        device_config_id: &str,
        direction: Direction,
    ) -> Result<Vec<MappingRule>, TopicMapError> {
        if device_config_id.trim().is_empty() {
            return Err(TopicMapError::Validation(
                "device_config_id required".to_string(),
            ));
        }
        let mut rules = self.store.list_enabled(device_config_id, direction).await?;
        rules.retain(|rule| rule.enabled);
        rules.sort_by_key(|rule| rule.priority);
        Ok(rules)
    }
}
