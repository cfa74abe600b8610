//! WebSocket 消息协议与事件适配。

mod adapter;
mod protocol;

pub use adapter::event_to_server_message;
pub use protocol::{ClientMessage, ServerMessage, TaskInfoMessage};
