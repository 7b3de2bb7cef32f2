//! 主题网关 Hook：设备鉴权、订阅/发布授权与主题转换。

use crate::error::HookError;
use crate::forward::Forwarder;
use crate::hook::{Hook, PublishDecision};
use crate::identity::{IdentityResolver, voucher};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use domain::{ClientInfo, ConnectRequest, PLUGIN_USERNAME, PublishMessage, ROOT_USERNAME};
use serde_json::json;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tg_devdebug::{DebugLogEntry, DebugLogSink, LogAction, LogDirection, LogOutcome};
use tg_topicmap::MappingService;
use tg_topicmap::validator::{extract_device_number, validate_publish, validate_subscribe};
use tracing::{debug, info, warn};

pub const STATUS_ONLINE: &[u8] = b"1";
pub const STATUS_OFFLINE: &[u8] = b"0";

pub fn status_topic(device_id: &str) -> String {
    format!("devices/status/{}", device_id)
}

/// 上行信封：`{"device_id": ..., "values": <base64 原始载荷>}`。
pub fn up_envelope(device_id: &str, payload: &[u8]) -> Vec<u8> {
    json!({
        "device_id": device_id,
        "values": STANDARD.encode(payload),
    })
    .to_string()
    .into_bytes()
}

/// 特权账号口令。
#[derive(Clone)]
pub struct PrivilegedCredentials {
    pub root_password: String,
    pub plugin_password: String,
}

impl PrivilegedCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        let expected = match username {
            ROOT_USERNAME => &self.root_password,
            PLUGIN_USERNAME => &self.plugin_password,
            _ => return false,
        };
        expected.as_bytes().ct_eq(password.as_bytes()).into()
    }
}

impl std::fmt::Debug for PrivilegedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivilegedCredentials").finish_non_exhaustive()
    }
}

pub struct TopicGateHook {
    identity: IdentityResolver,
    mappings: MappingService,
    debug_log: DebugLogSink,
    forwarder: Arc<dyn Forwarder>,
    credentials: PrivilegedCredentials,
}

impl TopicGateHook {
    pub fn new(
        identity: IdentityResolver,
        mappings: MappingService,
        debug_log: DebugLogSink,
        forwarder: Arc<dyn Forwarder>,
        credentials: PrivilegedCredentials,
    ) -> Self {
        Self {
            identity,
            mappings,
            debug_log,
            forwarder,
            credentials,
        }
    }

    /// 后台写入调试日志，不等待结果。
    fn record(&self, device_id: &str, entry: DebugLogEntry) {
        if device_id.is_empty() {
            return;
        }
        let sink = self.debug_log.clone();
        let device_id = device_id.to_string();
        tokio::spawn(async move {
            if let Err(err) = sink.write(&device_id, entry).await {
                debug!(target: "tg.devdebug", device_id = %device_id, error = %err, "debug_log_write_failed");
            }
        });
    }

    /// 凭证校验失败时尽力定位设备（只用用户名），记录拒绝日志；不记录口令。
    async fn record_failed_auth(&self, client: &ClientInfo, request: &ConnectRequest, error: &HookError) {
        if request.password.is_empty() {
            return;
        }
        let fallback = voucher(&request.username, "");
        if let Ok(Some(device)) = self.identity.device_by_voucher(&fallback).await {
            self.record(
                &device.id,
                DebugLogEntry::new(LogDirection::Na, LogAction::Auth, LogOutcome::Denied)
                    .client(&client.client_id, &request.username)
                    .error(error.to_string()),
            );
        }
    }

    async fn report_status(&self, client: &ClientInfo, status: &'static [u8]) {
        let device_id = match self.identity.bound_device(&client.client_id).await {
            Ok(Some(device_id)) => device_id,
            Ok(None) => {
                warn!(target: "tg.hooks", client_id = %client.client_id, "status_report_device_not_bound");
                return;
            }
            Err(err) => {
                warn!(target: "tg.hooks", client_id = %client.client_id, error = %err, "status_report_binding_lookup_failed");
                return;
            }
        };
        if let Err(err) = self.forwarder.send(&status_topic(&device_id), status.to_vec()).await {
            tg_telemetry::record_forward_failure();
            warn!(target: "tg.hooks", device_id = %device_id, error = %err, "status_report_failed");
        }
    }

    /// 平台下发到规范下行主题时，按设备映射额外转发到设备自定义主题。
    async fn forward_down(&self, client: &ClientInfo, message: &PublishMessage) {
        let Some(device_number) = extract_device_number(&message.topic) else {
            return;
        };
        let device = match self.identity.device_by_number(&device_number).await {
            Ok(Some(device)) => device,
            Ok(None) => return,
            Err(err) => {
                warn!(target: "tg.hooks", device_number = %device_number, error = %err, "down_forward_device_lookup_failed");
                return;
            }
        };
        let Some(config_id) = device.device_config_id.as_deref().filter(|id| !id.is_empty()) else {
            return;
        };
        let route = match self
            .mappings
            .resolve_down_source(config_id, &message.topic, &device_number, &message.payload)
            .await
        {
            Ok(Some(route)) => route,
            Ok(None) => return,
            Err(err) => {
                warn!(target: "tg.hooks", topic = %message.topic, error = %err, "down_forward_resolve_failed");
                return;
            }
        };

        let entry = DebugLogEntry::new(LogDirection::Down, LogAction::Forward, LogOutcome::Ok)
            .client(&client.client_id, &client.username)
            .topic(&message.topic)
            .payload(&message.payload)
            .meta("mapped", true)
            .meta("target_topic", message.topic.as_str())
            .meta("source_topic", route.source_topic.as_str());
        match self.forwarder.send(&route.source_topic, route.payload).await {
            Ok(()) => {
                tg_telemetry::record_down_forwarded();
                info!(
                    target: "tg.hooks",
                    topic = %message.topic,
                    source_topic = %route.source_topic,
                    rule_id = route.rule_id,
                    "down_forwarded"
                );
                self.record(&device.id, entry);
            }
            Err(err) => {
                tg_telemetry::record_forward_failure();
                warn!(target: "tg.hooks", topic = %message.topic, error = %err, "down_forward_failed");
                let mut entry = entry.error(err.to_string());
                entry.outcome = LogOutcome::Error;
                self.record(&device.id, entry);
            }
        }
    }

    async fn publish_from_device(&self, client: &ClientInfo, message: &PublishMessage) -> Result<PublishDecision, HookError> {
        let device_id = self
            .identity
            .bound_device(&client.client_id)
            .await?
            .ok_or_else(|| HookError::Permission("client is not bound to a device".to_string()))?;
        let entry = DebugLogEntry::new(LogDirection::Up, LogAction::Publish, LogOutcome::Ok)
            .client(&client.client_id, &client.username)
            .topic(&message.topic)
            .payload(&message.payload);

        if let Some(config_id) = self.identity.bound_config(&device_id).await? {
            if let Some(target_topic) = self.mappings.resolve_up_target(&config_id, &message.topic).await? {
                let payload = up_envelope(&device_id, &message.payload);
                let entry = entry.meta("mapped", true).meta("target_topic", target_topic.as_str());
                match self.forwarder.send(&target_topic, payload.clone()).await {
                    Ok(()) => {
                        info!(
                            target: "tg.hooks",
                            topic = %message.topic,
                            target_topic = %target_topic,
                            client_id = %client.client_id,
                            "up_redirected"
                        );
                        let mut entry = entry;
                        entry.outcome = LogOutcome::Discarded;
                        self.record(&device_id, entry);
                    }
                    Err(err) => {
                        tg_telemetry::record_forward_failure();
                        warn!(target: "tg.hooks", topic = %message.topic, error = %err, "up_redirect_failed");
                        let mut entry = entry.error(err.to_string());
                        entry.outcome = LogOutcome::Error;
                        self.record(&device_id, entry);
                    }
                }
                tg_telemetry::record_publish_redirected();
                return Ok(PublishDecision::Redirect { target_topic, payload });
            }
            debug!(target: "tg.hooks", topic = %message.topic, client_id = %client.client_id, "up_mapping_not_matched");
        }

        if !validate_publish(&message.topic) {
            let mut entry = entry.error("permission denied");
            entry.outcome = LogOutcome::Denied;
            self.record(&device_id, entry);
            warn!(target: "tg.hooks", topic = %message.topic, client_id = %client.client_id, "publish_denied");
            return Err(HookError::Permission(format!("publish to {}", message.topic)));
        }

        self.record(&device_id, entry);
        Ok(PublishDecision::Accept(up_envelope(&device_id, &message.payload)))
    }

    async fn subscribe_custom(&self, client: &ClientInfo, device_id: &str, topic: &str) -> Result<bool, HookError> {
        let Some(config_id) = self.identity.bound_config(device_id).await? else {
            return Ok(false);
        };
        let allowed = self.mappings.allow_down_subscribe(&config_id, topic).await?;
        if allowed {
            info!(target: "tg.hooks", topic = %topic, client_id = %client.client_id, "custom_subscribe_allowed");
        }
        Ok(allowed)
    }
}

#[async_trait]
impl Hook for TopicGateHook {
    fn name(&self) -> &str {
        "topic-gate"
    }

    async fn on_auth(&self, client: &ClientInfo, request: &ConnectRequest) -> Result<(), HookError> {
        if domain::is_privileged(&request.username) {
            let verified = self.credentials.verify(&request.username, &request.password);
            tg_telemetry::record_auth(verified);
            if !verified {
                warn!(target: "tg.hooks", username = %request.username, client_id = %client.client_id, "privileged_password_error");
                return Err(HookError::Auth("password error".to_string()));
            }
            return Ok(());
        }

        info!(target: "tg.hooks", username = %request.username, client_id = %client.client_id, "auth_started");
        let lookup = self
            .identity
            .device_by_voucher(&voucher(&request.username, &request.password))
            .await
            .map_err(HookError::from);
        let device = match lookup {
            Ok(Some(device)) => device,
            Ok(None) => {
                let err = HookError::Auth("device not found".to_string());
                warn!(target: "tg.hooks", client_id = %client.client_id, error = %err, "auth_failed");
                tg_telemetry::record_auth(false);
                self.record_failed_auth(client, request, &err).await;
                return Err(err);
            }
            Err(err) => {
                warn!(target: "tg.hooks", client_id = %client.client_id, error = %err, "auth_failed");
                tg_telemetry::record_auth(false);
                self.record_failed_auth(client, request, &err).await;
                return Err(err);
            }
        };

        info!(target: "tg.hooks", client_id = %client.client_id, device_id = %device.id, "auth_passed");
        self.record(
            &device.id,
            DebugLogEntry::new(LogDirection::Na, LogAction::Auth, LogOutcome::Ok)
                .client(&client.client_id, &request.username),
        );
        if let Err(err) = self.identity.bind(&client.client_id, &device.id).await {
            warn!(target: "tg.hooks", client_id = %client.client_id, error = %err, "client_binding_failed");
            tg_telemetry::record_auth(false);
            return Err(err.into());
        }
        tg_telemetry::record_auth(true);
        Ok(())
    }

    async fn on_connected(&self, client: &ClientInfo) {
        if client.is_privileged() {
            return;
        }
        self.report_status(client, STATUS_ONLINE).await;
    }

    async fn on_subscribe(&self, client: &ClientInfo, topic: &str) -> Result<(), HookError> {
        if client.is_privileged() {
            return Ok(());
        }
        let binding = self.identity.bound_device(&client.client_id).await;
        let device_id = binding.as_ref().ok().cloned().flatten().unwrap_or_default();
        let entry = DebugLogEntry::new(LogDirection::Na, LogAction::Subscribe, LogOutcome::Ok)
            .client(&client.client_id, &client.username)
            .topic(topic);

        if validate_subscribe(topic) {
            tg_telemetry::record_subscribe(true);
            self.record(&device_id, entry);
            return Ok(());
        }

        let allowed = match binding {
            Ok(Some(device_id)) => self.subscribe_custom(client, &device_id, topic).await,
            Ok(None) => Ok(false),
            Err(err) => Err(err.into()),
        };
        match allowed {
            Ok(true) => {
                tg_telemetry::record_subscribe(true);
                self.record(&device_id, entry.meta("custom_mapping_allowed", true));
                Ok(())
            }
            Ok(false) => {
                tg_telemetry::record_subscribe(false);
                warn!(target: "tg.hooks", topic = %topic, client_id = %client.client_id, "subscribe_denied");
                let mut entry = entry.error("permission denied");
                entry.outcome = LogOutcome::Denied;
                self.record(&device_id, entry);
                Err(HookError::Permission(format!("subscribe to {}", topic)))
            }
            Err(err) => {
                tg_telemetry::record_subscribe(false);
                warn!(target: "tg.hooks", topic = %topic, client_id = %client.client_id, error = %err, "subscribe_check_failed");
                let mut entry = entry.error(err.to_string());
                entry.outcome = LogOutcome::Error;
                self.record(&device_id, entry);
                Err(err)
            }
        }
    }

    async fn on_publish(&self, client: &ClientInfo, message: &PublishMessage) -> PublishDecision {
        debug!(
            target: "tg.hooks",
            topic = %message.topic,
            client_id = %client.client_id,
            username = %client.username,
            payload_size = message.payload.len(),
            "publish_arrived"
        );
        if client.is_privileged() {
            self.forward_down(client, message).await;
            return PublishDecision::Accept(message.payload.clone());
        }
        match self.publish_from_device(client, message).await {
            Ok(decision) => {
                if matches!(decision, PublishDecision::Accept(_)) {
                    tg_telemetry::record_publish_ok();
                }
                decision
            }
            Err(err) => {
                tg_telemetry::record_publish_denied();
                PublishDecision::Reject(err)
            }
        }
    }

    async fn on_closed(&self, client: &ClientInfo, reason: Option<&str>) {
        info!(
            target: "tg.hooks",
            username = %client.username,
            client_id = %client.client_id,
            reason = reason.unwrap_or(""),
            "connection_closed"
        );
        if client.is_privileged() {
            return;
        }
        self.report_status(client, STATUS_OFFLINE).await;
    }
}
