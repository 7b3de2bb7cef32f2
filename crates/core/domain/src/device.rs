use serde::{Deserialize, Serialize};

/// 设备记录（仅包含主题层需要的字段）。
///
/// 对应 PostgreSQL `devices` 表；`device_config_id` 为空表示设备未绑定
/// 设备配置，不参与自定义主题映射。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: String,
    pub device_number: String,
    pub voucher: String,
    pub device_config_id: Option<String>,
}
