//! # topicgate Storage 模块
//!
//! 主题鉴权层的存储协作方：接口定义 + 多种后端实现。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：`MappingRuleStore`、`DeviceStore`、`KvStore`
//! 2. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 3. **连接管理层** (`connection.rs`)：Postgres 连接池与 Redis 客户端
//! 4. **实现层**：
//!    - `postgres/`：映射规则与设备查询（生产环境）
//!    - `redis_kv`：Redis 键值缓存（生产环境）
//!    - `in_memory/`：内存实现（单元测试、集成测试）
//!
//! ## 数据表
//!
//! - `device_topic_mappings`：id, device_config_id, name, direction, source_topic,
//!   target_topic, data_identifier, priority, enabled, description, created_at, updated_at
//! - `devices`：id, device_number, voucher, device_config_id
//!
//! ## 并发
//!
//! 所有实现都是 `Send + Sync`，可被任意多个连接事件并发调用；
//! 内存实现使用 `RwLock<HashMap>`，Redis 实现使用多路复用连接。

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod postgres;
pub mod redis_kv;
pub mod traits;

pub use connection::*;
pub use error::*;
pub use traits::*;

pub use in_memory::{InMemoryDeviceStore, InMemoryKvStore, InMemoryMappingRuleStore};
pub use postgres::{PgDeviceStore, PgMappingRuleStore};
pub use redis_kv::RedisKvStore;
