use mapgen_core::{Game, TaskId, TaskStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// 任务跟踪器对外广播的事件类型。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    /// 任务已提交到生成后端。
    Submitted {
        /// 任务 ID。
        task_id: TaskId,
        /// 目标游戏。
        game: Game,
    },
    /// 任务状态发生变化。
    StatusChanged {
        /// 任务 ID。
        task_id: TaskId,
        /// 最新状态。
        status: TaskStatus,
    },
    /// 后台轮询结束。
    PollingStopped {
        /// 任务 ID。
        task_id: TaskId,
        /// 结束原因。
        reason: PollStopReason,
    },
}

/// 轮询结束原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollStopReason {
    /// 任务进入终态（完成或失败）。
    Finished,
    /// 后端不再认识该任务。
    Lost,
    /// 超过轮询时限。
    TimedOut,
    /// 后端返回了不可重试的错误。
    BackendError,
}

/// 基于 `tokio::broadcast` 的事件广播器。
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<TaskEvent>,
}

impl EventBroadcaster {
    /// 创建事件广播器。
    ///
    /// `capacity` 表示内部广播队列容量。
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// 广播一个事件。
    pub fn emit(&self, event: TaskEvent) {
        let _ = self.sender.send(event);
    }

    /// 订阅事件流。
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
        }
    }
}

/// 事件接收流包装器。
#[derive(Debug)]
pub struct EventStream {
    receiver: broadcast::Receiver<TaskEvent>,
}

impl EventStream {
    /// 异步接收下一条事件。
    ///
    /// 落后超过队列容量时返回 `RecvError::Lagged`，之后仍可继续接收。
    pub async fn recv(&mut self) -> Result<TaskEvent, RecvError> {
        self.receiver.recv().await
    }

    /// 非阻塞尝试接收一条事件。
    pub fn try_recv(&mut self) -> Result<TaskEvent, TryRecvError> {
        self.receiver.try_recv()
    }
}
