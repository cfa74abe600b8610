use mapgen_core::{BackendError, DomainError, TaskId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("参数无效: {0}")]
    InvalidSettings(#[from] DomainError),

    #[error("后端错误: {0}")]
    Backend(#[from] BackendError),

    #[error("任务未被跟踪: {0}")]
    TaskNotTracked(TaskId),

    #[error("HTTP 客户端错误: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, GenerationError>;
