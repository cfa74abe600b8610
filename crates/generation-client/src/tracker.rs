//! 任务跟踪器。
//!
//! 记录已提交的生成任务，按需或在后台轮询后端状态，并通过事件广播状态变化。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mapgen_core::{
    BackendError, Coordinates, Game, GenerationBackend, GenerationPayload, TaskId, TaskStatus,
    UiSettings, preprocess,
};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    EventBroadcaster, EventStream, GenerationClientConfig, GenerationError, PollStopReason,
    Result, TaskEvent,
};

/// 已跟踪任务的记录。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub game: Game,
    pub coordinates: Coordinates,
    pub size: u32,
    pub status: TaskStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct PollingConfig {
    enabled: bool,
    interval: Duration,
    timeout: Duration,
}

struct TrackerInner {
    backend: Arc<dyn GenerationBackend>,
    tasks: RwLock<HashMap<TaskId, TaskRecord>>,
    pollers: Mutex<HashMap<TaskId, JoinHandle<()>>>,
    events: EventBroadcaster,
    polling: PollingConfig,
}

/// 生成任务跟踪器，可廉价克隆并在多个 handler 间共享。
#[derive(Clone)]
pub struct TaskTracker {
    inner: Arc<TrackerInner>,
}

impl TaskTracker {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: &GenerationClientConfig) -> Self {
        info!(
            auto_poll = config.auto_poll,
            poll_interval_ms = config.poll_interval_ms,
            poll_timeout_secs = config.poll_timeout_secs,
            "initializing task tracker"
        );

        Self {
            inner: Arc::new(TrackerInner {
                backend,
                tasks: RwLock::new(HashMap::new()),
                pollers: Mutex::new(HashMap::new()),
                events: EventBroadcaster::new(config.event_buffer_size),
                polling: PollingConfig {
                    enabled: config.auto_poll,
                    interval: config.poll_interval(),
                    timeout: config.poll_timeout(),
                },
            }),
        }
    }

    /// 预处理 UI 设置并提交任务。
    #[tracing::instrument(skip(self, settings), fields(game = %settings.game_code))]
    pub async fn submit(&self, settings: UiSettings) -> Result<TaskRecord> {
        let payload = preprocess(settings)?;
        self.submit_payload(payload).await
    }

    /// 提交已经预处理好的负载。
    #[tracing::instrument(skip(self, payload))]
    pub async fn submit_payload(&self, payload: GenerationPayload) -> Result<TaskRecord> {
        let task_id = self.inner.backend.submit(&payload).await?;
        let now = Utc::now();

        let record = TaskRecord {
            task_id: task_id.clone(),
            game: payload.game_code,
            coordinates: payload.coordinates,
            size: payload.size,
            status: TaskStatus::queued(),
            submitted_at: now,
            updated_at: now,
        };

        info!(task_id = %task_id, game = %record.game, "tracking generation task");

        self.inner
            .tasks
            .write()
            .await
            .insert(task_id.clone(), record.clone());

        self.inner.events.emit(TaskEvent::Submitted {
            task_id: task_id.clone(),
            game: record.game,
        });

        if self.inner.polling.enabled {
            self.spawn_poller(task_id).await;
        }

        Ok(record)
    }

    /// 向后端查询最新状态。未被跟踪的任务同样可以查询，只是不会记录。
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self, task_id: &TaskId) -> Result<TaskStatus> {
        Ok(self.inner.refresh(task_id).await?)
    }

    pub async fn get(&self, task_id: &TaskId) -> Option<TaskRecord> {
        self.inner.tasks.read().await.get(task_id).cloned()
    }

    /// 列出所有已跟踪任务，最新提交的在前。
    pub async fn list(&self) -> Vec<TaskRecord> {
        let tasks = self.inner.tasks.read().await;
        let mut records: Vec<TaskRecord> = tasks.values().cloned().collect();
        records.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| a.task_id.cmp(&b.task_id))
        });
        records
    }

    /// 停止跟踪任务并取消其后台轮询。
    #[tracing::instrument(skip(self))]
    pub async fn forget(&self, task_id: &TaskId) -> Result<TaskRecord> {
        let record = self
            .inner
            .tasks
            .write()
            .await
            .remove(task_id)
            .ok_or_else(|| GenerationError::TaskNotTracked(task_id.clone()))?;

        if let Some(handle) = self.inner.pollers.lock().await.remove(task_id) {
            handle.abort();
        }

        info!(task_id = %task_id, "task forgotten");
        Ok(record)
    }

    pub fn subscribe_events(&self) -> EventStream {
        self.inner.events.subscribe()
    }

    /// 当前仍在运行的后台轮询数量。
    pub async fn active_pollers(&self) -> usize {
        self.inner.pollers.lock().await.len()
    }

    /// 取消全部后台轮询。
    pub async fn shutdown(&self) {
        let mut pollers = self.inner.pollers.lock().await;
        for (task_id, handle) in pollers.drain() {
            debug!(task_id = %task_id, "aborting poller");
            handle.abort();
        }
    }

    async fn spawn_poller(&self, task_id: TaskId) {
        // 持锁期间启动，保证轮询结束时的移除发生在插入之后
        let mut pollers = self.inner.pollers.lock().await;
        let handle = tokio::spawn(poll_task(self.inner.clone(), task_id.clone()));
        if let Some(previous) = pollers.insert(task_id.clone(), handle) {
            debug!(task_id = %task_id, "replacing existing poller");
            previous.abort();
        }
    }
}

impl TrackerInner {
    async fn refresh(&self, task_id: &TaskId) -> std::result::Result<TaskStatus, BackendError> {
        let status = self.backend.task_status(task_id).await?;
        self.apply_status(task_id, &status).await;
        Ok(status)
    }

    async fn apply_status(&self, task_id: &TaskId, status: &TaskStatus) {
        let changed = {
            let mut tasks = self.tasks.write().await;
            match tasks.get_mut(task_id) {
                Some(record) if record.status != *status => {
                    record.status = status.clone();
                    record.updated_at = Utc::now();
                    true
                }
                _ => false,
            }
        };

        if changed {
            info!(task_id = %task_id, state = %status.state, "task status changed");
            self.events.emit(TaskEvent::StatusChanged {
                task_id: task_id.clone(),
                status: status.clone(),
            });
        }
    }
}

async fn poll_task(inner: Arc<TrackerInner>, task_id: TaskId) {
    let deadline = Instant::now() + inner.polling.timeout;
    let mut interval = tokio::time::interval(inner.polling.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // 第一次 tick 立即完成，跳过它以便在一个完整间隔后再查询
    interval.tick().await;

    let reason = loop {
        interval.tick().await;
        if Instant::now() >= deadline {
            break PollStopReason::TimedOut;
        }

        match inner.refresh(&task_id).await {
            Ok(status) if status.is_terminal() => break PollStopReason::Finished,
            Ok(_) => {}
            Err(BackendError::TaskNotFound(_)) => break PollStopReason::Lost,
            Err(err) if err.is_transient() => {
                warn!(task_id = %task_id, error = %err, "task status poll failed, retrying");
            }
            Err(err) => {
                warn!(task_id = %task_id, error = %err, "task status poll failed permanently");
                break PollStopReason::BackendError;
            }
        }
    };

    inner.pollers.lock().await.remove(&task_id);
    info!(task_id = %task_id, reason = ?reason, "stopped polling task");
    inner.events.emit(TaskEvent::PollingStopped { task_id, reason });
}
