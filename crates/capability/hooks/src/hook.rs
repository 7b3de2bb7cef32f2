//! Hook 接口与流水线。
//!
//! 流水线按注册顺序依次调用各 Hook，遇到第一个拒绝即停止；
//! 发布事件上前一个 Hook 放行后的载荷会交给下一个 Hook。

use crate::error::HookError;
use async_trait::async_trait;
use domain::{ClientInfo, ConnectRequest, PublishMessage};
use std::sync::Arc;

/// 单个 Hook 对发布事件的决定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishDecision {
    /// 放行，载荷可能已被改写
    Accept(Vec<u8>),
    /// 拒绝
    Reject(HookError),
    /// 已转发到其他主题，原消息丢弃
    Redirect { target_topic: String, payload: Vec<u8> },
}

/// 流水线对宿主暴露的发布结果。
///
/// `Discarded` 不是错误，宿主应丢弃原消息但不向客户端报告失败；
/// `payload` 为已转发到 `target_topic` 的内容。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Deliver(Vec<u8>),
    Rejected(HookError),
    Discarded { target_topic: String, payload: Vec<u8> },
}

impl PublishOutcome {
    pub fn is_discarded(&self) -> bool {
        matches!(self, PublishOutcome::Discarded { .. })
    }
}

/// Broker 事件回调；默认实现全部放行。
#[async_trait]
pub trait Hook: Send + Sync {
    fn name(&self) -> &str;

    async fn on_auth(&self, _client: &ClientInfo, _request: &ConnectRequest) -> Result<(), HookError> {
        Ok(())
    }

    async fn on_connected(&self, _client: &ClientInfo) {}

    async fn on_subscribe(&self, _client: &ClientInfo, _topic: &str) -> Result<(), HookError> {
        Ok(())
    }

    async fn on_publish(&self, _client: &ClientInfo, message: &PublishMessage) -> PublishDecision {
        PublishDecision::Accept(message.payload.clone())
    }

    async fn on_closed(&self, _client: &ClientInfo, _reason: Option<&str>) {}
}

/// 有序 Hook 列表。
#[derive(Clone, Default)]
pub struct HookPipeline {
    hooks: Vec<Arc<dyn Hook>>,
}

impl HookPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|hook| hook.name()).collect()
    }

    pub async fn auth(&self, client: &ClientInfo, request: &ConnectRequest) -> Result<(), HookError> {
        for hook in &self.hooks {
            hook.on_auth(client, request).await?;
        }
        Ok(())
    }

    pub async fn connected(&self, client: &ClientInfo) {
        for hook in &self.hooks {
            hook.on_connected(client).await;
        }
    }

    pub async fn subscribe(&self, client: &ClientInfo, topic: &str) -> Result<(), HookError> {
        for hook in &self.hooks {
            hook.on_subscribe(client, topic).await?;
        }
        Ok(())
    }

    pub async fn publish(&self, client: &ClientInfo, message: PublishMessage) -> PublishOutcome {
        let mut message = message;
        for hook in &self.hooks {
            match hook.on_publish(client, &message).await {
                PublishDecision::Accept(payload) => message.payload = payload,
                PublishDecision::Reject(err) => return PublishOutcome::Rejected(err),
                PublishDecision::Redirect { target_topic, payload } => {
                    return PublishOutcome::Discarded { target_topic, payload };
                }
            }
        }
        PublishOutcome::Deliver(message.payload)
    }

    pub async fn closed(&self, client: &ClientInfo, reason: Option<&str>) {
        for hook in &self.hooks {
            hook.on_closed(client, reason).await;
        }
    }
}
