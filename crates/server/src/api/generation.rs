//! 地图生成任务 API 路由。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use generation_client::TaskRecord;
use mapgen_api_types::GenerateResponse;
use mapgen_core::{GenerationPayload, TaskId, TaskStatus, UiSettings, preprocess};
use serde::Serialize;
use tracing::info;

use super::error::ApiError;
use super::state::AppState;

/// 任务状态响应，状态字段平铺在顶层。
#[derive(Debug, Serialize)]
pub struct TaskStatusResponse {
    pub task_id: TaskId,
    #[serde(flatten)]
    pub status: TaskStatus,
}

/// 创建生成任务 API 路由。
pub fn create_generation_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/api/generate/preview", post(preview))
        .route("/api/tasks", get(list_tasks))
        .route("/api/tasks/{task_id}", get(task_status).delete(forget_task))
}

/// 提交生成任务。
async fn generate(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<UiSettings>,
) -> Result<(StatusCode, Json<GenerateResponse>), ApiError> {
    let record = state.tracker.submit(settings).await?;
    info!(task_id = %record.task_id, game = %record.game, "generation task accepted");
    Ok((
        StatusCode::ACCEPTED,
        Json(GenerateResponse {
            task_id: record.task_id.into_inner(),
        }),
    ))
}

/// 返回将要发送给后端的负载，不访问后端。
async fn preview(Json(settings): Json<UiSettings>) -> Result<Json<GenerationPayload>, ApiError> {
    Ok(Json(preprocess(settings)?))
}

async fn list_tasks(State(state): State<Arc<AppState>>) -> Json<Vec<TaskRecord>> {
    Json(state.tracker.list().await)
}

/// 向后端查询任务最新状态。
async fn task_status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatusResponse>, ApiError> {
    let task_id = TaskId::new(task_id)?;
    let status = state.tracker.refresh(&task_id).await?;
    Ok(Json(TaskStatusResponse { task_id, status }))
}

async fn forget_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskRecord>, ApiError> {
    let task_id = TaskId::new(task_id)?;
    Ok(Json(state.tracker.forget(&task_id).await?))
}
