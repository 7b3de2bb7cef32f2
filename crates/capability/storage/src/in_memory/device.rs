//! 设备内存存储实现
//!
//! 仅用于本地演示和测试。

use crate::error::StorageError;
use crate::traits::DeviceStore;
use domain::DeviceRecord;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// 设备内存存储
///
/// 使用 RwLock + HashMap 提供线程安全的内存存储，按设备 ID 索引。
pub struct InMemoryDeviceStore {
    devices: RwLock<HashMap<String, DeviceRecord>>,
    unavailable: AtomicBool,
}

impl InMemoryDeviceStore {
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// 写入或覆盖设备。
    pub fn upsert(&self, device: DeviceRecord) -> Result<(), StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        map.insert(device.id.clone(), device);
        Ok(())
    }

    /// 模拟存储不可达。
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn find_where(
        &self,
        predicate: impl Fn(&DeviceRecord) -> bool,
    ) -> Result<Option<DeviceRecord>, StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::new("device store unavailable"));
        }
        let map = self
            .devices
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.values().find(|device| predicate(device)).cloned())
    }
}

impl Default for InMemoryDeviceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn find_by_voucher(&self, voucher: &str) -> Result<Option<DeviceRecord>, StorageError> {
        self.find_where(|device| device.voucher == voucher)
    }

    async fn find_by_id(&self, device_id: &str) -> Result<Option<DeviceRecord>, StorageError> {
        self.find_where(|device| device.id == device_id)
    }

    async fn find_by_number(
        &self,
        device_number: &str,
    ) -> Result<Option<DeviceRecord>, StorageError> {
        self.find_where(|device| device.device_number == device_number)
    }
}
