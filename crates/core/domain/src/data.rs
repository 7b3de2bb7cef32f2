/// 连接身份：Broker 为每个连接提供的客户端信息。
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub client_id: String,
    pub username: String,
}

impl ClientInfo {
    pub fn new(client_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            username: username.into(),
        }
    }

    /// 是否为特权账号（root/plugin）。
    pub fn is_privileged(&self) -> bool {
        crate::is_privileged(&self.username)
    }
}

/// CONNECT 鉴权请求。
#[derive(Debug, Clone, Default)]
pub struct ConnectRequest {
    pub username: String,
    pub password: String,
}

impl ConnectRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// 到达 Broker 的 PUBLISH 消息。
#[derive(Debug, Clone)]
pub struct PublishMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl PublishMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}
