//! 映射规则内存存储实现
//!
//! 按插入顺序保存规则，查询时过滤启用状态但不排序，
//! 与 Postgres 未带 `order by` 的行为一致。

use crate::error::StorageError;
use crate::traits::MappingRuleStore;
use domain::{Direction, MappingRule};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 映射规则内存存储
pub struct InMemoryMappingRuleStore {
    rules: RwLock<Vec<MappingRule>>,
    unavailable: AtomicBool,
    loads: AtomicUsize,
}

impl InMemoryMappingRuleStore {
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
            unavailable: AtomicBool::new(false),
            loads: AtomicUsize::new(0),
        }
    }

    /// 追加规则（模拟管理端写入）。
    pub fn insert(&self, rule: MappingRule) -> Result<(), StorageError> {
        let mut rules = self
            .rules
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        rules.push(rule);
        Ok(())
    }

    /// 按 ID 删除规则（模拟管理端删除）。
    pub fn remove(&self, id: i64) -> Result<bool, StorageError> {
        let mut rules = self
            .rules
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let before = rules.len();
        rules.retain(|rule| rule.id != id);
        Ok(rules.len() != before)
    }

    /// 模拟存储不可达。
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// 累计查询次数。
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryMappingRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MappingRuleStore for InMemoryMappingRuleStore {
    async fn list_enabled(
        &self,
        device_config_id: &str,
        direction: Direction,
    ) -> Result<Vec<MappingRule>, StorageError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::new("mapping store unavailable"));
        }
        let rules = self
            .rules
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(rules
            .iter()
            .filter(|rule| {
                rule.enabled
                    && rule.direction == direction
                    && rule.device_config_id == device_config_id
            })
            .cloned()
            .collect())
    }
}
