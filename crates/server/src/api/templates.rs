//! 模板文件 API 路由。
//!
//! 提供模板目录内 schema 等文件的浏览、读取、编辑、重命名、复制与删除能力。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use mapgen_api_types::{
    CreateDirectoryRequest, DeleteQuery, DeletedResponse, MoveRequest, PathQuery, WriteFileRequest,
};
use mapgen_core::Game;
use serde::Deserialize;
use serde_json::Value;
use system_capabilities::{DirectoryInfo, FileContent, FileSystemEntry, SearchOptions, SearchResult};

use super::error::ApiError;
use super::state::AppState;

/// 创建模板 API 路由。
pub fn create_template_router() -> Router<Arc<AppState>> {
    Router::new()
        // 列出目录内容
        .route("/api/templates", get(list_templates))
        // 读取、写入、删除文件
        .route(
            "/api/templates/file",
            get(read_template).put(write_template).delete(delete_template),
        )
        .route("/api/templates/rename", post(rename_template))
        .route("/api/templates/copy", post(copy_template))
        .route("/api/templates/directory", post(create_directory))
        // 搜索文件
        .route("/api/templates/search", get(search_templates))
        // 按游戏读取默认 schema
        .route("/api/schemas/{game}/{kind}", get(default_schema))
}

/// 列出模板目录内容。
async fn list_templates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<DirectoryInfo>, ApiError> {
    Ok(Json(state.templates.list_directory(&query.path)?))
}

/// 读取模板文件。
async fn read_template(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<FileContent>, ApiError> {
    Ok(Json(state.templates.read_text(&query.path)?))
}

/// 写入模板文件。
async fn write_template(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WriteFileRequest>,
) -> Result<Json<FileSystemEntry>, ApiError> {
    let entry = state
        .templates
        .write_file(&request.path, &request.content, request.overwrite)?;
    Ok(Json(entry))
}

async fn delete_template(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<DeletedResponse>, ApiError> {
    state.templates.delete(&query.path, query.recursive)?;
    Ok(Json(DeletedResponse {
        path: query.path,
        deleted: true,
    }))
}

async fn rename_template(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<FileSystemEntry>, ApiError> {
    Ok(Json(state.templates.rename(&request.from, &request.to)?))
}

async fn copy_template(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<FileSystemEntry>, ApiError> {
    Ok(Json(state.templates.copy_file(&request.from, &request.to)?))
}

async fn create_directory(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDirectoryRequest>,
) -> Result<Json<FileSystemEntry>, ApiError> {
    Ok(Json(state.templates.create_directory(&request.path)?))
}

/// 搜索文件查询参数。
#[derive(Debug, Deserialize)]
struct SearchQuery {
    /// 基础路径，默认为模板根目录。
    #[serde(default)]
    path: String,
    /// 搜索模式（glob 格式）。
    pattern: String,
    /// 是否递归搜索。
    #[serde(default = "default_recursive")]
    recursive: bool,
    /// 最大搜索深度。
    #[serde(default = "default_max_depth")]
    max_depth: usize,
    /// 最大结果数量。
    #[serde(default = "default_max_results")]
    max_results: usize,
}

fn default_recursive() -> bool {
    true
}

fn default_max_depth() -> usize {
    10
}

fn default_max_results() -> usize {
    100
}

/// 搜索模板文件。
async fn search_templates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResult>, ApiError> {
    let options = SearchOptions {
        pattern: query.pattern,
        recursive: query.recursive,
        max_depth: query.max_depth,
        max_results: query.max_results,
    };
    let result = state.templates.search_files(&query.path, &options)?;
    Ok(Json(result))
}

/// 读取 `{game}-{kind}-schema.json` 并以 JSON 返回。
async fn default_schema(
    State(state): State<Arc<AppState>>,
    Path((game, kind)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let game: Game = game
        .parse()
        .map_err(|_| ApiError::not_found("SCHEMA_NOT_FOUND", format!("unknown game: {game}")))?;

    if !matches!(kind.as_str(), "texture" | "tree") {
        return Err(ApiError::not_found(
            "SCHEMA_NOT_FOUND",
            format!("unknown schema kind: {kind}"),
        ));
    }

    let file = state
        .templates
        .read_text(&format!("{}-{}-schema.json", game.slug(), kind))?;
    let schema = serde_json::from_str(&file.content).map_err(|err| {
        system_capabilities::FileSystemError::InvalidContent(format!(
            "{} is not valid JSON: {err}",
            file.path
        ))
    })?;
    Ok(Json(schema))
}
