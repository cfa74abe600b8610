//! API 路由模块。
//!
//! 提供地图生成任务、模板编辑与产物下载所需的 HTTP / WebSocket API。

pub mod artifacts;
pub mod error;
pub mod generation;
pub mod state;
pub mod templates;
pub mod ws;

use std::sync::Arc;

use anyhow::Context;
use axum::{Json, Router, extract::DefaultBodyLimit, http::HeaderValue, routing::get};
use mapgen_api_types::HealthCheckResponse;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use artifacts::create_artifact_router;
pub use error::ApiError;
pub use generation::create_generation_router;
pub use state::AppState;
pub use templates::create_template_router;
pub use ws::websocket_handler;

/// JSON 包装带来的额外开销。
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// 组装全部路由。
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.templates.policy().max_file_bytes)
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .saturating_add(BODY_LIMIT_SLACK);

    Router::new()
        .route("/health", get(health))
        .route("/ws/tasks", get(websocket_handler))
        .merge(create_generation_router())
        .merge(create_template_router())
        .merge(create_artifact_router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 根据配置的来源构建 CORS 层，空列表时允许任意来源。
pub fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }

    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).with_context(|| format!("invalid CORS origin: {origin}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

async fn health() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse::ok())
}
