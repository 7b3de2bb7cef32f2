use tg_storage::StorageError;

/// 主题映射错误。
#[derive(Debug, thiserror::Error)]
pub enum TopicMapError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(#[from] StorageError),
}
