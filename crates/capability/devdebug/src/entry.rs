use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 日志方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogDirection {
    Up,
    Down,
    Na,
}

/// 日志动作。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogAction {
    Auth,
    Subscribe,
    Publish,
    Forward,
}

/// 日志结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutcome {
    Ok,
    Denied,
    Error,
    Discarded,
}

/// 单条调试日志。协议相关字段放在 `meta` 中。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugLogEntry {
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    pub direction: LogDirection,
    pub action: LogAction,
    pub outcome: LogOutcome,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payload: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl DebugLogEntry {
    pub fn new(direction: LogDirection, action: LogAction, outcome: LogOutcome) -> Self {
        Self {
            ts: String::new(),
            device_id: String::new(),
            protocol: "mqtt".to_string(),
            direction,
            action,
            outcome,
            error: String::new(),
            payload: String::new(),
            meta: Map::new(),
        }
    }

    pub fn client(self, client_id: &str, username: &str) -> Self {
        self.meta("client_id", client_id).meta("username", username)
    }

    pub fn topic(self, topic: &str) -> Self {
        self.meta("topic", topic)
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }

    /// 非 UTF-8 字节按替换字符记录。
    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = String::from_utf8_lossy(payload).into_owned();
        self
    }

    pub fn meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }
}
