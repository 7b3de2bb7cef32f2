//! topicgate Hook 宿主适配器：加载插件并通过 HTTP 暴露 Broker Hook。

mod handlers;
mod middleware;
mod response;
mod routes;

use std::sync::Arc;
use std::time::Duration;
use tg_config::AppConfig;
use tg_hooks::{
    MqttForwarder, MqttForwarderConfig, Plugin, PluginContext, PluginRuntime, PrivilegedCredentials,
};
use tg_storage::{PgDeviceStore, PgMappingRuleStore, RedisKvStore, connect_pool};
use tg_telemetry::init_tracing;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<PluginRuntime>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing();

    // 映射规则与设备凭证
    let pool = connect_pool(&config.database_url, 10).await?;
    let devices = Arc::new(PgDeviceStore::new(pool.clone()));
    let rules = Arc::new(PgMappingRuleStore::new(pool));
    // 映射快照、凭证缓存、连接绑定、调试日志
    let kv = Arc::new(RedisKvStore::connect(&config.redis_url)?);

    // 转发通道以 root 身份连接 Broker
    let (forwarder, _forward_loop) = MqttForwarder::connect(MqttForwarderConfig {
        host: config.mqtt_host.clone(),
        port: config.mqtt_port,
        username: Some(domain::ROOT_USERNAME.to_string()),
        password: Some(config.mqtt_root_password.clone()),
        qos: config.forward_qos,
        ready_wait: Duration::from_secs(config.forward_ready_wait_seconds),
        confirm_timeout: Duration::from_secs(config.forward_confirm_timeout_seconds),
    })?;

    let plugin = Plugin::new();
    let runtime = plugin
        .load(PluginContext {
            devices,
            rules,
            kv,
            forwarder: Arc::new(forwarder),
            credentials: PrivilegedCredentials {
                root_password: config.mqtt_root_password.clone(),
                plugin_password: config.mqtt_plugin_password.clone(),
            },
            cache_ttl_seconds: config.topicmap_cache_ttl_seconds,
            upstream_hooks: Vec::new(),
            debug_sink: None,
        })
        .await?;
    info!(target: "tg.server", plugin = plugin.name(), hooks = ?runtime.pipeline.hook_names(), "plugin ready");

    let app = routes::create_router(AppState { runtime });
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(target: "tg.server", addr = %config.http_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    plugin.unload().await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use base64::Engine;
    use domain::{DeviceRecord, Direction, MappingRule};
    use http_body_util::BodyExt;
    use tg_hooks::RecordingForwarder;
    use tg_storage::{InMemoryDeviceStore, InMemoryKvStore, InMemoryMappingRuleStore, KvStore};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        kv: Arc<InMemoryKvStore>,
        rules: Arc<InMemoryMappingRuleStore>,
        forwarder: Arc<RecordingForwarder>,
    }

    async fn test_app() -> TestApp {
        let devices = Arc::new(InMemoryDeviceStore::new());
        devices
            .upsert(DeviceRecord {
                id: "dev-1".to_string(),
                device_number: "D1".to_string(),
                voucher: r#"{"username":"u1","password":"p1"}"#.to_string(),
                device_config_id: Some("cfg-1".to_string()),
            })
            .expect("upsert");
        let rules = Arc::new(InMemoryMappingRuleStore::new());
        rules
            .insert(MappingRule {
                id: 1,
                device_config_id: "cfg-1".to_string(),
                name: "report".to_string(),
                direction: Direction::Up,
                source_topic: "vendor/{device_number}/report".to_string(),
                target_topic: "devices/telemetry/control".to_string(),
                data_identifier: None,
                priority: 1,
                enabled: true,
                description: None,
                created_at: None,
                updated_at: None,
            })
            .expect("insert");
        let kv = Arc::new(InMemoryKvStore::new());
        let forwarder = Arc::new(RecordingForwarder::new());
        let runtime = Plugin::new()
            .load(PluginContext {
                devices,
                rules: rules.clone(),
                kv: kv.clone(),
                forwarder: forwarder.clone(),
                credentials: PrivilegedCredentials {
                    root_password: "r".to_string(),
                    plugin_password: "p".to_string(),
                },
                cache_ttl_seconds: 60,
                upstream_hooks: Vec::new(),
                debug_sink: None,
            })
            .await
            .expect("load");
        TestApp {
            router: routes::create_router(AppState { runtime }),
            kv,
            rules,
            forwarder,
        }
    }

    async fn post(router: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        let response = router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        assert!(response.headers().contains_key("x-request-id"));
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let json = serde_json::from_slice(&bytes).expect("json");
        (status, json)
    }

    #[tokio::test]
    async fn health_reports_plugin() {
        let app = test_app().await;
        let request = Request::builder().uri("/health").body(Body::empty()).expect("request");
        let response = app.router.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn auth_hook_allows_and_denies() {
        let app = test_app().await;
        let (status, body) = post(
            &app.router,
            "/hooks/auth",
            serde_json::json!({"client_id": "c1", "username": "u1", "password": "p1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["allow"], true);

        let (status, body) = post(
            &app.router,
            "/hooks/auth",
            serde_json::json!({"client_id": "c2", "username": "u1", "password": "bad"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "HOOK.AUTH");
    }

    #[tokio::test]
    async fn publish_hook_reports_discard_and_deliver() {
        let app = test_app().await;
        post(
            &app.router,
            "/hooks/auth",
            serde_json::json!({"client_id": "c1", "username": "u1", "password": "p1"}),
        )
        .await;

        let (status, body) = post(
            &app.router,
            "/hooks/publish",
            serde_json::json!({"client_id": "c1", "username": "u1", "topic": "vendor/D1/report", "payload": "hi"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["action"], "discard");
        assert_eq!(body["data"]["target_topic"], "devices/telemetry/control");
        let forwarded = base64::engine::general_purpose::STANDARD
            .decode(body["data"]["payload"].as_str().expect("payload"))
            .expect("base64");
        assert_eq!(forwarded, tg_hooks::up_envelope("dev-1", b"hi"));
        assert_eq!(app.forwarder.sent().len(), 1);

        let (status, body) = post(
            &app.router,
            "/hooks/publish",
            serde_json::json!({"client_id": "c1", "username": "u1", "topic": "devices/event/x", "payload": "aGk=", "encoding": "base64"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["action"], "deliver");
        let delivered = base64::engine::general_purpose::STANDARD
            .decode(body["data"]["payload"].as_str().expect("payload"))
            .expect("base64");
        assert_eq!(delivered, tg_hooks::up_envelope("dev-1", b"hi"));

        let (status, body) = post(
            &app.router,
            "/hooks/subscribe",
            serde_json::json!({"client_id": "c1", "username": "u1", "topic": "vendor/D1/other"}),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "HOOK.PERMISSION");
    }

    #[tokio::test]
    async fn invalidate_endpoint_clears_snapshots() {
        let app = test_app().await;
        post(
            &app.router,
            "/hooks/auth",
            serde_json::json!({"client_id": "c1", "username": "u1", "password": "p1"}),
        )
        .await;
        post(
            &app.router,
            "/hooks/publish",
            serde_json::json!({"client_id": "c1", "username": "u1", "topic": "vendor/D1/report", "payload": "x"}),
        )
        .await;
        assert!(app.kv.get("topicmap:up:cfg-1").await.expect("get").is_some());
        let loads = app.rules.load_count();

        let (status, body) = post(
            &app.router,
            "/api/topic-mappings/cfg-1/invalidate",
            serde_json::json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["device_config_id"], "cfg-1");
        assert!(app.kv.get("topicmap:up:cfg-1").await.expect("get").is_none());
        assert_eq!(app.rules.load_count(), loads);
    }
}
