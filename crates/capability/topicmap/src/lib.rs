//! 主题映射能力：模板匹配、静态白名单、映射规则仓库/缓存与映射服务。

pub mod cache;
pub mod error;
pub mod matcher;
pub mod repository;
pub mod service;
pub mod validator;

pub use cache::{DEFAULT_CACHE_TTL_SECONDS, MappingCache, cache_key};
pub use error::TopicMapError;
pub use matcher::{CompileMode, PatternCache, TemplateError, TopicPattern};
pub use repository::MappingRepository;
pub use service::{DownRoute, MappingService};
