//! 内存存储实现模块
//!
//! 仅用于本地演示和测试。
//!
//! 包含以下实现：
//! - MappingRuleStore: InMemoryMappingRuleStore
//! - DeviceStore: InMemoryDeviceStore
//! - KvStore: InMemoryKvStore

pub mod device;
pub mod kv;
pub mod mapping_rule;

pub use device::*;
pub use kv::*;
pub use mapping_rule::*;
