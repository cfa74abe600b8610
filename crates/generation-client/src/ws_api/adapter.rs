use super::protocol::ServerMessage;
use crate::events::TaskEvent;

/// 将内部 TaskEvent 转换为 WebSocket ServerMessage。
pub fn event_to_server_message(event: TaskEvent) -> ServerMessage {
    match event {
        TaskEvent::Submitted { task_id, game } => ServerMessage::TaskSubmitted {
            task_id: task_id.to_string(),
            game: game.code().to_string(),
        },
        TaskEvent::StatusChanged { task_id, status } => ServerMessage::TaskStatus {
            task_id: task_id.to_string(),
            status,
        },
        TaskEvent::PollingStopped { task_id, reason } => ServerMessage::PollingStopped {
            task_id: task_id.to_string(),
            reason,
        },
    }
}
