//! 生成产物 API 路由。
//!
//! 产物目录只读浏览，支持流式下载与删除。

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
    routing::get,
};
use mapgen_api_types::{DeleteQuery, DeletedResponse, PathQuery};
use system_capabilities::{DirectoryInfo, FileSystemError};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use super::error::ApiError;
use super::state::AppState;

/// 创建产物 API 路由。
pub fn create_artifact_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/artifacts", get(list_artifacts).delete(delete_artifact))
        .route("/api/artifacts/download", get(download_artifact))
}

async fn list_artifacts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<DirectoryInfo>, ApiError> {
    Ok(Json(state.artifacts.list_directory(&query.path)?))
}

/// 以附件形式流式返回产物文件。
async fn download_artifact(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Response, ApiError> {
    let resolved = state.artifacts.resolve_file(&query.path)?;
    let file = tokio::fs::File::open(&resolved.absolute)
        .await
        .map_err(FileSystemError::from)?;

    debug!(path = %query.path, size = resolved.size, "streaming artifact");

    let body = Body::from_stream(ReaderStream::new(file));
    let disposition = format!(
        "attachment; filename=\"{}\"",
        resolved.name.replace(['"', '\\'], "_")
    );
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(content_type(&resolved.name)),
            ),
            (header::CONTENT_LENGTH, HeaderValue::from(resolved.size)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

async fn delete_artifact(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<DeletedResponse>, ApiError> {
    state.artifacts.delete(&query.path, query.recursive)?;
    info!(path = %query.path, recursive = query.recursive, "artifact deleted");
    Ok(Json(DeletedResponse {
        path: query.path,
        deleted: true,
    }))
}

fn content_type(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "zip" => "application/zip",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "xml" | "i3d" | "osm" => "application/xml",
        "txt" | "log" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
