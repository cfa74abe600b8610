use mapgen_core::TaskStatus;
use serde::{Deserialize, Serialize};

use crate::{PollStopReason, TaskRecord};

/// 客户端发送的 WebSocket 消息。
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// 查询已跟踪任务列表。
    ListTasks,
    /// 立即向后端查询指定任务的状态。
    RefreshStatus { task_id: String },
    /// 停止跟踪指定任务。
    ForgetTask { task_id: String },
}

/// 服务端发送的 WebSocket 消息。
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// 任务已提交。
    TaskSubmitted { task_id: String, game: String },
    /// 任务状态。
    TaskStatus { task_id: String, status: TaskStatus },
    /// 后台轮询已结束。
    PollingStopped {
        task_id: String,
        reason: PollStopReason,
    },
    /// 任务列表响应。
    TaskList { tasks: Vec<TaskInfoMessage> },
    /// 任务已停止跟踪。
    TaskForgotten { task_id: String },
    /// 错误消息。
    Error { message: String },
}

/// 任务信息（WebSocket 传输用）。
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskInfoMessage {
    pub task_id: String,
    pub game: String,
    pub coordinates: [f64; 2],
    pub size: u32,
    pub status: TaskStatus,
    pub submitted_at: String,
    pub updated_at: String,
}

impl From<TaskRecord> for TaskInfoMessage {
    fn from(record: TaskRecord) -> Self {
        Self {
            task_id: record.task_id.to_string(),
            game: record.game.code().to_string(),
            coordinates: record.coordinates.into(),
            size: record.size,
            status: record.status,
            submitted_at: record.submitted_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}
