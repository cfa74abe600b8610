use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use generation_client::{GenerationClientConfig, TaskTracker};
use mapgen_core::{
    BackendError, GenerationBackend, GenerationPayload, TaskId, TaskState, TaskStatus,
};
use mapgen_server::{AppState, ServerConfig, create_router};
use serde_json::Value;
use system_capabilities::FileSystemCapabilities;
use tempfile::TempDir;
use tower::ServiceExt;

/// 按任务 ID 返回固定状态的生成后端，未配置的任务视为不存在。
#[derive(Default)]
pub struct MockBackend {
    next_id: AtomicUsize,
    statuses: Mutex<HashMap<String, TaskStatus>>,
    unavailable: Mutex<bool>,
}

impl MockBackend {
    pub fn set_status(&self, task_id: &str, state: TaskState) {
        self.statuses.lock().unwrap().insert(
            task_id.to_string(),
            TaskStatus {
                state,
                description: None,
                queue_position: None,
            },
        );
    }

    pub fn go_offline(&self) {
        *self.unavailable.lock().unwrap() = true;
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn submit(&self, _payload: &GenerationPayload) -> Result<TaskId, BackendError> {
        if *self.unavailable.lock().unwrap() {
            return Err(BackendError::Unavailable("connection refused".to_string()));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let task_id = TaskId::new(format!("task-{n}")).unwrap();
        self.set_status(task_id.as_str(), TaskState::Queued);
        Ok(task_id)
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<TaskStatus, BackendError> {
        if *self.unavailable.lock().unwrap() {
            return Err(BackendError::Unavailable("connection refused".to_string()));
        }
        self.statuses
            .lock()
            .unwrap()
            .get(task_id.as_str())
            .cloned()
            .ok_or_else(|| BackendError::TaskNotFound(task_id.clone()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub backend: Arc<MockBackend>,
    pub templates: TempDir,
    pub artifacts: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let templates = TempDir::new().unwrap();
        let artifacts = TempDir::new().unwrap();
        let mut config = ServerConfig::default();
        config.storage.max_file_bytes = 1024;

        let backend = Arc::new(MockBackend::default());
        let client_config = GenerationClientConfig {
            auto_poll: false,
            ..GenerationClientConfig::default()
        };
        let tracker = TaskTracker::new(backend.clone(), &client_config);

        let state = AppState::new(
            tracker,
            FileSystemCapabilities::new(templates.path(), config.templates_policy()).unwrap(),
            FileSystemCapabilities::new(artifacts.path(), config.artifacts_policy()).unwrap(),
        );

        Self {
            router: create_router(Arc::new(state)),
            backend,
            templates,
            artifacts,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.raw(method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn raw(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let response = self.send(method, uri, body).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub fn write_template(&self, relative: &str, content: &str) {
        write(self.templates.path(), relative, content);
    }

    pub fn write_artifact(&self, relative: &str, content: &str) {
        write(self.artifacts.path(), relative, content);
    }
}

fn write(root: &std::path::Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}
