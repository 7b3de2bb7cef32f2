//! Broker 事件 Hook：鉴权、订阅/发布授权、主题转换与转发。
//!
//! 连接状态：未认证 → 已认证（绑定 client_id → device_id）→ 订阅/发布 → 关闭。
//! 特权账号（root/plugin）只校验口令，跳过全部设备解析。

pub mod error;
pub mod forward;
pub mod gate;
pub mod hook;
pub mod identity;
pub mod plugin;

pub use error::{ForwardError, HookError, PluginError};
pub use forward::{Forwarder, MqttForwarder, MqttForwarderConfig, RecordingForwarder};
pub use gate::{PrivilegedCredentials, TopicGateHook, status_topic, up_envelope};
pub use hook::{Hook, HookPipeline, PublishDecision, PublishOutcome};
pub use identity::{IdentityResolver, binding_key, voucher};
pub use plugin::{PLUGIN_NAME, Plugin, PluginContext, PluginRuntime};
