pub mod data;
pub mod device;
pub mod mapping;

pub use data::{ClientInfo, ConnectRequest, PublishMessage};
pub use device::DeviceRecord;
pub use mapping::{Direction, MappingRule, ParseDirectionError};

/// 保留的特权账号：平台根账号。
pub const ROOT_USERNAME: &str = "root";
/// 保留的特权账号：插件账号。
pub const PLUGIN_USERNAME: &str = "plugin";

/// 判断用户名是否为保留的特权账号。
pub fn is_privileged(username: &str) -> bool {
    username == ROOT_USERNAME || username == PLUGIN_USERNAME
}
