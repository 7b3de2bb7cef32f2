//! 设备主题映射规则。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 映射方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// 设备 → 平台
    Up,
    /// 平台 → 设备
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDirectionError(pub String);

impl fmt::Display for ParseDirectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid direction: {}", self.0)
    }
}

impl std::error::Error for ParseDirectionError {}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(ParseDirectionError(other.to_string())),
        }
    }
}

/// 主题映射规则，对应表 `device_topic_mappings`。
///
/// - `source_topic`：设备侧主题模板（支持 `+` 与 `{var}`，不允许 `#`）
/// - `target_topic`：平台侧规范主题模板
/// - `data_identifier`：下行时与载荷 `method` 字段比对，用于在同一规范主题下区分多条规则
/// - `priority`：数值越小优先级越高
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    pub id: i64,
    pub device_config_id: String,
    pub name: String,
    pub direction: Direction,
    pub source_topic: String,
    pub target_topic: String,
    pub data_identifier: Option<String>,
    pub priority: i32,
    pub enabled: bool,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MappingRule {
    /// 去除首尾空白后的数据标识符；空字符串视为未设置。
    pub fn identifier(&self) -> Option<&str> {
        self.data_identifier
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}
