use async_trait::async_trait;
use thiserror::Error;

use super::{GenerationPayload, TaskId, TaskStatus};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),
    #[error("generation backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("task not found on generation backend: {0}")]
    TaskNotFound(TaskId),
    #[error("invalid response from generation backend: {0}")]
    InvalidResponse(String),
    #[error("generation backend timeout")]
    Timeout,
}

impl BackendError {
    /// Whether a later retry of the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout)
            || matches!(self, Self::Rejected { status, .. } if *status >= 500)
    }
}

/// The external service that actually generates maps.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn submit(&self, payload: &GenerationPayload) -> Result<TaskId, BackendError>;

    async fn task_status(&self, task_id: &TaskId) -> Result<TaskStatus, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coordinates, Game, TaskState};
    use std::sync::Mutex;

    struct FixedBackend {
        submitted: Mutex<Vec<GenerationPayload>>,
    }

    #[async_trait]
    impl GenerationBackend for FixedBackend {
        async fn submit(&self, payload: &GenerationPayload) -> Result<TaskId, BackendError> {
            self.submitted
                .lock()
                .expect("submitted lock")
                .push(payload.clone());
            TaskId::new("task-1").map_err(|err| BackendError::InvalidResponse(err.to_string()))
        }

        async fn task_status(&self, task_id: &TaskId) -> Result<TaskStatus, BackendError> {
            if task_id.as_str() == "task-1" {
                Ok(TaskStatus {
                    state: TaskState::Processing,
                    description: None,
                    queue_position: None,
                })
            } else {
                Err(BackendError::TaskNotFound(task_id.clone()))
            }
        }
    }

    fn payload() -> GenerationPayload {
        GenerationPayload {
            game_code: Game::Fs25,
            dtm_code: "srtm30".to_string(),
            coordinates: Coordinates::new(45.0, 20.0).expect("valid coordinates"),
            size: 2048,
            rotation: 0,
            output_size: None,
            dem_settings: None,
            background_settings: None,
            grle_settings: None,
            i3d_settings: None,
            texture_settings: None,
            spline_settings: None,
            satellite_settings: None,
            custom_osm: None,
            texture_custom_schema: None,
            tree_custom_schema: None,
        }
    }

    #[tokio::test]
    async fn backend_trait_is_object_safe() {
        let backend: Box<dyn GenerationBackend> = Box::new(FixedBackend {
            submitted: Mutex::new(Vec::new()),
        });

        let task_id = backend.submit(&payload()).await.expect("submit succeeds");
        let status = backend.task_status(&task_id).await.expect("status succeeds");
        assert_eq!(status.state, TaskState::Processing);

        let missing = TaskId::new("other").expect("valid task id");
        assert_eq!(
            backend.task_status(&missing).await,
            Err(BackendError::TaskNotFound(missing))
        );
    }

    #[test]
    fn transient_errors_are_classified() {
        assert!(BackendError::Timeout.is_transient());
        assert!(BackendError::Unavailable("refused".into()).is_transient());
        assert!(
            BackendError::Rejected {
                status: 503,
                message: "busy".into()
            }
            .is_transient()
        );
        assert!(
            !BackendError::Rejected {
                status: 422,
                message: "bad".into()
            }
            .is_transient()
        );
    }
}
