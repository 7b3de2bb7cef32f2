use tg_storage::StorageError;
use tg_topicmap::TopicMapError;

/// Hook 拒绝原因。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    /// 凭证错误或设备不存在，连接被拒绝
    #[error("auth error: {0}")]
    Auth(String),
    /// 主题未授权
    #[error("permission denied: {0}")]
    Permission(String),
    /// 缓存或持久化存储不可用（失败即拒绝）
    #[error("store error: {0}")]
    Store(String),
}

impl From<StorageError> for HookError {
    fn from(err: StorageError) -> Self {
        HookError::Store(err.to_string())
    }
}

impl From<TopicMapError> for HookError {
    fn from(err: TopicMapError) -> Self {
        HookError::Store(err.to_string())
    }
}

/// 转发失败（只记录，不影响 Hook 结果）。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForwardError {
    #[error("transport not ready")]
    NotReady,
    #[error("publish failed: {0}")]
    Publish(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PluginError {
    #[error("config error: {0}")]
    Config(String),
    #[error("plugin unloaded")]
    Unloaded,
}
