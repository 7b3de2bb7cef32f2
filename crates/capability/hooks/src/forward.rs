//! 转发通道：上下线状态上报、上行重定向、下行额外转发。

use crate::error::ForwardError;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

/// 出站发布协作方。
///
/// 实现必须不阻塞调用方：确认等待在后台完成，失败只记录日志。
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), ForwardError>;
}

/// MQTT 转发配置。
#[derive(Debug, Clone)]
pub struct MqttForwarderConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub qos: u8,
    /// 等待连接就绪的上限
    pub ready_wait: Duration,
    /// 发布交付到事件循环的超时
    pub confirm_timeout: Duration,
}

const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// 基于 rumqttc 的转发实现，自动重连。
#[derive(Clone)]
pub struct MqttForwarder {
    client: AsyncClient,
    ready: Arc<AtomicBool>,
    qos: QoS,
    ready_wait: Duration,
    confirm_timeout: Duration,
}

impl MqttForwarder {
    pub fn connect(
        config: MqttForwarderConfig,
    ) -> Result<(Self, tokio::task::JoinHandle<()>), ForwardError> {
        let client_id = format!("tg-forward-{}", uuid::Uuid::new_v4());
        let mut options = MqttOptions::new(client_id, config.host, config.port);
        options.set_keep_alive(Duration::from_secs(30));
        if let (Some(username), Some(password)) = (config.username, config.password) {
            options.set_credentials(username, password);
        }
        let (client, mut eventloop) = AsyncClient::new(options, 64);
        let ready = Arc::new(AtomicBool::new(false));
        let loop_ready = ready.clone();
        let handle = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        loop_ready.store(true, Ordering::SeqCst);
                        info!(target: "tg.forward", "mqtt forwarder connected");
                    }
                    Ok(_) => {}
                    Err(err) => {
                        loop_ready.store(false, Ordering::SeqCst);
                        warn!(target: "tg.forward", "mqtt forward eventloop error: {}", err);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });
        Ok((
            Self {
                client,
                ready,
                qos: qos_from_u8(config.qos),
                ready_wait: config.ready_wait,
                confirm_timeout: config.confirm_timeout,
            },
            handle,
        ))
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Forwarder for MqttForwarder {
    async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), ForwardError> {
        let forwarder = self.clone();
        let topic = topic.to_string();
        tokio::spawn(async move {
            let mut waited = Duration::ZERO;
            while !forwarder.is_ready() && waited < forwarder.ready_wait {
                tokio::time::sleep(READY_POLL_INTERVAL).await;
                waited += READY_POLL_INTERVAL;
            }
            let publish = forwarder
                .client
                .publish(topic.clone(), forwarder.qos, false, payload);
            match tokio::time::timeout(forwarder.confirm_timeout, publish).await {
                Ok(Ok(())) => {
                    info!(target: "tg.forward", topic = %topic, "forward_published");
                }
                Ok(Err(err)) => {
                    tg_telemetry::record_forward_failure();
                    warn!(target: "tg.forward", topic = %topic, error = %err, "forward_publish_failed");
                }
                Err(_) => {
                    tg_telemetry::record_forward_failure();
                    warn!(target: "tg.forward", topic = %topic, "forward_publish_timeout");
                }
            }
        });
        Ok(())
    }
}

fn qos_from_u8(value: u8) -> QoS {
    match value {
        0 => QoS::AtMostOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtLeastOnce,
    }
}

/// 记录型转发实现，用于测试与本地演示；可切换为失败模式。
#[derive(Debug, Default)]
pub struct RecordingForwarder {
    sent: Mutex<Vec<(String, Vec<u8>)>>,
    failing: AtomicBool,
}

impl RecordingForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// 已转发的 (topic, payload)，按发送顺序。
    pub fn sent(&self) -> Vec<(String, Vec<u8>)> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Forwarder for RecordingForwarder {
    async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), ForwardError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ForwardError::Publish("transport unavailable".to_string()));
        }
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| ForwardError::Publish("lock failed".to_string()))?;
        sent.push((topic.to_string(), payload));
        Ok(())
    }
}
