//! 路由定义
//!
//! - 健康检查：/health
//! - Broker Hook：/hooks/{auth,connected,subscribe,publish,closed}
//! - 映射缓存失效：/api/topic-mappings/{device_config_id}/invalidate（规则管理端在增删改后调用）

use crate::AppState;
use crate::handlers::*;
use crate::middleware::request_context;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/hooks/auth", post(auth_hook))
        .route("/hooks/connected", post(connected_hook))
        .route("/hooks/subscribe", post(subscribe_hook))
        .route("/hooks/publish", post(publish_hook))
        .route("/hooks/closed", post(closed_hook))
        .route(
            "/api/topic-mappings/:device_config_id/invalidate",
            post(invalidate_mappings),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_context))
}
