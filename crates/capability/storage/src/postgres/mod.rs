//! # PostgreSQL 存储实现模块
//!
//! ## 设计原则
//!
//! 1. **参数化查询**：所有 SQL 查询使用参数绑定，防止 SQL 注入
//! 2. **只读**：规则与设备由管理端维护，本层只做查询
//! 3. **连接池管理**：使用连接池复用数据库连接
//!
//! ## 包含的实现
//!
//! - **MappingRuleStore** (`mapping_rule.rs`)：表 `device_topic_mappings`
//! - **DeviceStore** (`device.rs`)：表 `devices`

pub mod device;
pub mod mapping_rule;

pub use device::PgDeviceStore;
pub use mapping_rule::PgMappingRuleStore;
