//! 存储接口 Trait 定义
//!
//! 主题层只把持久化与缓存当作协作方使用：
//! - MappingRuleStore：映射规则（只读）
//! - DeviceStore：设备与凭证
//! - KvStore：键值缓存（Get/Set/Del + 列表流水线）
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发
//! - 并发安全由实现自身负责

use crate::error::StorageError;
use async_trait::async_trait;
use domain::{DeviceRecord, Direction, MappingRule};

/// 映射规则存储接口
#[async_trait]
pub trait MappingRuleStore: Send + Sync {
    /// 查询指定设备配置、指定方向下所有启用的规则。
    ///
    /// 不保证返回顺序，排序由调用方负责。
    async fn list_enabled(
        &self,
        device_config_id: &str,
        direction: Direction,
    ) -> Result<Vec<MappingRule>, StorageError>;
}

/// 设备存储接口
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// 根据凭证查找设备
    async fn find_by_voucher(&self, voucher: &str) -> Result<Option<DeviceRecord>, StorageError>;

    /// 根据设备 ID 查找设备
    async fn find_by_id(&self, device_id: &str) -> Result<Option<DeviceRecord>, StorageError>;

    /// 根据设备编号查找设备
    async fn find_by_number(
        &self,
        device_number: &str,
    ) -> Result<Option<DeviceRecord>, StorageError>;
}

/// 键值缓存接口
#[async_trait]
pub trait KvStore: Send + Sync {
    /// 读取字符串值，不存在返回 None。
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// 写入字符串值；`ttl_seconds` 为 None 表示永不过期。
    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: Option<u64>,
    ) -> Result<(), StorageError>;

    /// 删除若干键（不存在的键忽略）。
    async fn delete(&self, keys: &[String]) -> Result<(), StorageError>;

    /// 在一次流水线中执行 LPUSH + LTRIM(0, max_items-1) + 可选 EXPIRE。
    async fn push_capped(
        &self,
        key: &str,
        value: &str,
        max_items: usize,
        ttl_seconds: Option<u64>,
    ) -> Result<(), StorageError>;

    /// 读取整个列表（新在前）。
    async fn list(&self, key: &str) -> Result<Vec<String>, StorageError>;

    /// 剩余存活秒数；键不存在或无过期时间返回 None。
    async fn ttl_seconds(&self, key: &str) -> Result<Option<u64>, StorageError>;
}
