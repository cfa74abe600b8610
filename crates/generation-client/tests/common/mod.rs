use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mapgen_core::{
    BackendError, GenerationBackend, GenerationPayload, TaskId, TaskState, TaskStatus, UiSettings,
};

type StatusReply = Result<TaskStatus, BackendError>;

/// 可编排返回值的生成后端。
///
/// 每个任务的状态按脚本顺序返回，最后一条会一直重复；没有脚本的任务报告 processing。
#[derive(Default)]
pub struct MockBackend {
    next_id: AtomicUsize,
    submitted: Mutex<Vec<GenerationPayload>>,
    scripts: Mutex<HashMap<String, VecDeque<StatusReply>>>,
    submit_error: Mutex<Option<BackendError>>,
    fixed_id: Mutex<Option<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, task_id: &str, replies: Vec<StatusReply>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(task_id.to_string(), replies.into());
    }

    pub fn fail_submissions(&self, error: BackendError) {
        *self.submit_error.lock().unwrap() = Some(error);
    }

    /// 之后每次提交都返回同一个任务 ID。
    pub fn reuse_id(&self, task_id: &str) {
        *self.fixed_id.lock().unwrap() = Some(task_id.to_string());
    }

    pub fn submitted(&self) -> Vec<GenerationPayload> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn submit(&self, payload: &GenerationPayload) -> Result<TaskId, BackendError> {
        if let Some(error) = self.submit_error.lock().unwrap().clone() {
            return Err(error);
        }

        self.submitted.lock().unwrap().push(payload.clone());
        if let Some(id) = self.fixed_id.lock().unwrap().clone() {
            return Ok(TaskId::new(id).unwrap());
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TaskId::new(format!("task-{n}")).unwrap())
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<TaskStatus, BackendError> {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(task_id.as_str()) {
            Some(replies) if replies.len() > 1 => replies.pop_front().unwrap(),
            Some(replies) => replies.front().cloned().unwrap_or_else(|| Ok(processing())),
            None => Ok(processing()),
        }
    }
}

pub fn status(state: TaskState) -> TaskStatus {
    TaskStatus {
        state,
        description: None,
        queue_position: None,
    }
}

pub fn processing() -> TaskStatus {
    status(TaskState::Processing)
}

pub fn settings() -> UiSettings {
    UiSettings {
        coordinates: "45.2850, 20.2370".to_string(),
        game_code: "FS25".to_string(),
        dtm_code: "srtm30".to_string(),
        size: 2048,
        ..UiSettings::default()
    }
}
