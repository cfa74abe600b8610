//! API 错误类型与 HTTP 响应映射。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use generation_client::GenerationError;
use mapgen_api_types::ErrorResponse;
use mapgen_core::{BackendError, DomainError};
use system_capabilities::FileSystemError;
use tracing::error;

/// API 错误类型。
#[derive(Debug)]
pub struct ApiError {
    pub message: String,
    pub code: &'static str,
    pub status: StatusCode,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            status,
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }
}

impl From<FileSystemError> for ApiError {
    fn from(err: FileSystemError) -> Self {
        let (status, code) = match &err {
            FileSystemError::PathNotFound(_) => (StatusCode::NOT_FOUND, "PATH_NOT_FOUND"),
            FileSystemError::NotADirectory(_) => (StatusCode::BAD_REQUEST, "NOT_A_DIRECTORY"),
            FileSystemError::NotAFile(_) => (StatusCode::BAD_REQUEST, "NOT_A_FILE"),
            FileSystemError::AlreadyExists(_) => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
            FileSystemError::DirectoryNotEmpty(_) => (StatusCode::CONFLICT, "DIRECTORY_NOT_EMPTY"),
            FileSystemError::InvalidPath(_) => (StatusCode::BAD_REQUEST, "INVALID_PATH"),
            FileSystemError::PathTraversal(_) => (StatusCode::FORBIDDEN, "PATH_TRAVERSAL"),
            FileSystemError::UnsupportedExtension(_) => {
                (StatusCode::BAD_REQUEST, "UNSUPPORTED_EXTENSION")
            }
            FileSystemError::InvalidContent(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_CONTENT")
            }
            FileSystemError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "TOO_LARGE"),
            FileSystemError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
            FileSystemError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            FileSystemError::Other(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        ApiError::new(status, code, err.to_string())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidTaskId(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "INVALID_TASK_ID", err.to_string())
            }
            other => ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_SETTINGS",
                other.to_string(),
            ),
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        let (status, code) = match &err {
            BackendError::TaskNotFound(_) => (StatusCode::NOT_FOUND, "TASK_NOT_FOUND"),
            BackendError::Unavailable(_) => (StatusCode::BAD_GATEWAY, "BACKEND_UNAVAILABLE"),
            BackendError::Rejected { .. } => (StatusCode::BAD_GATEWAY, "BACKEND_REJECTED"),
            BackendError::InvalidResponse(_) => {
                (StatusCode::BAD_GATEWAY, "BACKEND_INVALID_RESPONSE")
            }
            BackendError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "BACKEND_TIMEOUT"),
        };
        ApiError::new(status, code, err.to_string())
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::InvalidSettings(err) => err.into(),
            GenerationError::Backend(err) => err.into(),
            GenerationError::TaskNotTracked(task_id) => ApiError::not_found(
                "TASK_NOT_FOUND",
                format!("task is not tracked: {task_id}"),
            ),
            other => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                other.to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.code, message = %self.message, "request failed");
        }
        let body = Json(ErrorResponse {
            error: self.message,
            code: self.code.to_string(),
        });
        (self.status, body).into_response()
    }
}
