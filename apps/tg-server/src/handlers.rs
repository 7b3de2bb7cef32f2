//! Hook 宿主适配：把 Broker 的 Webhook 请求转成流水线调用。

use crate::AppState;
use crate::response::{bad_request_error, hook_error, internal_error, ok};
use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use domain::{ClientInfo, ConnectRequest, PublishMessage};
use serde::{Deserialize, Serialize};
use tg_hooks::{PLUGIN_NAME, PublishOutcome};
use tg_topicmap::TopicMapError;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ClientPayload {
    pub client_id: String,
    #[serde(default)]
    pub username: String,
}

impl ClientPayload {
    fn client(&self) -> ClientInfo {
        ClientInfo::new(self.client_id.clone(), self.username.clone())
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthPayload {
    #[serde(flatten)]
    pub client: ClientPayload,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SubscribePayload {
    #[serde(flatten)]
    pub client: ClientPayload,
    pub topic: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    #[default]
    Plain,
    Base64,
}

#[derive(Debug, Deserialize)]
pub struct PublishPayload {
    #[serde(flatten)]
    pub client: ClientPayload,
    pub topic: String,
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub encoding: PayloadEncoding,
}

#[derive(Debug, Deserialize)]
pub struct ClosedPayload {
    #[serde(flatten)]
    pub client: ClientPayload,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Verdict {
    pub allow: bool,
}

/// 发布结果：`deliver` 携带改写后的载荷（base64），`discard` 表示已重定向。
#[derive(Debug, Serialize)]
pub struct PublishVerdict {
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_topic: Option<String>,
}

pub async fn health() -> Response {
    ok(serde_json::json!({ "ok": true, "plugin": PLUGIN_NAME }))
}

pub async fn auth_hook(State(state): State<AppState>, Json(req): Json<AuthPayload>) -> Response {
    let client = req.client.client();
    let request = ConnectRequest::new(req.client.username.clone(), req.password);
    match state.runtime.pipeline.auth(&client, &request).await {
        Ok(()) => ok(Verdict { allow: true }),
        Err(err) => hook_error(&err),
    }
}

pub async fn connected_hook(State(state): State<AppState>, Json(req): Json<ClientPayload>) -> Response {
    state.runtime.pipeline.connected(&req.client()).await;
    ok(Verdict { allow: true })
}

pub async fn subscribe_hook(
    State(state): State<AppState>,
    Json(req): Json<SubscribePayload>,
) -> Response {
    match state
        .runtime
        .pipeline
        .subscribe(&req.client.client(), &req.topic)
        .await
    {
        Ok(()) => ok(Verdict { allow: true }),
        Err(err) => hook_error(&err),
    }
}

pub async fn publish_hook(State(state): State<AppState>, Json(req): Json<PublishPayload>) -> Response {
    let payload = match req.encoding {
        PayloadEncoding::Plain => req.payload.into_bytes(),
        PayloadEncoding::Base64 => match STANDARD.decode(req.payload.as_bytes()) {
            Ok(payload) => payload,
            Err(err) => return bad_request_error(format!("invalid base64 payload: {}", err)),
        },
    };
    let message = PublishMessage::new(req.topic, payload);
    match state
        .runtime
        .pipeline
        .publish(&req.client.client(), message)
        .await
    {
        PublishOutcome::Deliver(payload) => ok(PublishVerdict {
            action: "deliver",
            payload: Some(STANDARD.encode(payload)),
            target_topic: None,
        }),
        PublishOutcome::Discarded { target_topic, payload } => ok(PublishVerdict {
            action: "discard",
            payload: Some(STANDARD.encode(payload)),
            target_topic: Some(target_topic),
        }),
        PublishOutcome::Rejected(err) => hook_error(&err),
    }
}

pub async fn closed_hook(State(state): State<AppState>, Json(req): Json<ClosedPayload>) -> Response {
    state
        .runtime
        .pipeline
        .closed(&req.client.client(), req.reason.as_deref())
        .await;
    ok(Verdict { allow: true })
}

pub async fn invalidate_mappings(
    State(state): State<AppState>,
    Path(device_config_id): Path<String>,
) -> Response {
    match state.runtime.mappings.cache().invalidate(&device_config_id).await {
        Ok(()) => {
            info!(target: "tg.server", device_config_id = %device_config_id, "topic_mappings_invalidated");
            ok(serde_json::json!({ "device_config_id": device_config_id }))
        }
        Err(TopicMapError::Validation(message)) => bad_request_error(message),
        Err(err) => internal_error(err.to_string()),
    }
}
