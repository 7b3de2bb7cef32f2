//! 设备身份解析：凭证查找（先缓存后存储）与连接绑定。

use domain::DeviceRecord;
use std::sync::Arc;
use tg_storage::{DeviceStore, KvStore, StorageError};
use tracing::debug;

const BINDING_KEY_PREFIX: &str = "client_id_binding:";

pub fn binding_key(client_id: &str) -> String {
    format!("{}{}", BINDING_KEY_PREFIX, client_id)
}

/// 由用户名、口令构造凭证字符串；口令为空时只含用户名。
///
/// 原样拼接，不做 JSON 转义，与设备表中保存的凭证逐字节一致。
pub fn voucher(username: &str, password: &str) -> String {
    if password.is_empty() {
        format!(r#"{{"username":"{}"}}"#, username)
    } else {
        format!(r#"{{"username":"{}","password":"{}"}}"#, username, password)
    }
}

#[derive(Clone)]
pub struct IdentityResolver {
    devices: Arc<dyn DeviceStore>,
    kv: Arc<dyn KvStore>,
}

impl IdentityResolver {
    pub fn new(devices: Arc<dyn DeviceStore>, kv: Arc<dyn KvStore>) -> Self {
        Self { devices, kv }
    }

    /// 按凭证查找设备。
    ///
    /// 缓存中以凭证字符串为键保存设备 ID；缓存未命中或指向的设备已不存在时查询存储并回填。
    pub async fn device_by_voucher(&self, voucher: &str) -> Result<Option<DeviceRecord>, StorageError> {
        if let Some(device_id) = self.kv.get(voucher).await? {
            if let Some(device) = self.devices.find_by_id(&device_id).await? {
                return Ok(Some(device));
            }
            debug!(target: "tg.hooks", device_id = %device_id, "voucher_cache_stale");
        }
        let Some(device) = self.devices.find_by_voucher(voucher).await? else {
            return Ok(None);
        };
        self.kv.set(voucher, &device.id, None).await?;
        Ok(Some(device))
    }

    pub async fn device_by_id(&self, device_id: &str) -> Result<Option<DeviceRecord>, StorageError> {
        self.devices.find_by_id(device_id).await
    }

    pub async fn device_by_number(
        &self,
        device_number: &str,
    ) -> Result<Option<DeviceRecord>, StorageError> {
        self.devices.find_by_number(device_number).await
    }

    /// 绑定连接与设备，覆盖旧绑定；不设过期时间。
    pub async fn bind(&self, client_id: &str, device_id: &str) -> Result<(), StorageError> {
        self.kv.set(&binding_key(client_id), device_id, None).await
    }

    pub async fn bound_device(&self, client_id: &str) -> Result<Option<String>, StorageError> {
        if client_id.is_empty() {
            return Ok(None);
        }
        Ok(self
            .kv
            .get(&binding_key(client_id))
            .await?
            .filter(|device_id| !device_id.is_empty()))
    }

    /// 当前连接绑定设备的设备配置 ID。
    pub async fn bound_config(&self, device_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .device_by_id(device_id)
            .await?
            .and_then(|device| device.device_config_id)
            .filter(|config_id| !config_id.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voucher_format() {
        assert_eq!(voucher("u1", "p1"), r#"{"username":"u1","password":"p1"}"#);
        assert_eq!(voucher("u1", ""), r#"{"username":"u1"}"#);
    }

    #[test]
    fn voucher_keeps_credentials_unescaped() {
        assert_eq!(voucher("a\"b", ""), r#"{"username":"a"b"}"#);
        assert_eq!(
            voucher("u\\1", "p\"1"),
            r#"{"username":"u\1","password":"p"1"}"#
        );
    }
}
