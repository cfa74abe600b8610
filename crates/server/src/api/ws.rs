//! WebSocket API 处理器。
//!
//! 将任务跟踪器的事件推送给客户端，并响应客户端的任务查询消息。

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use generation_client::{EventStream, TaskTracker};
use generation_client::ws_api::{
    ClientMessage, ServerMessage, TaskInfoMessage, event_to_server_message,
};
use mapgen_core::TaskId;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::state::AppState;

/// Axum WebSocket 升级 handler。
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    info!("new WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state.tracker.clone()))
}

async fn handle_socket(socket: WebSocket, tracker: TaskTracker) {
    let (mut sender, mut receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(64);
    info!("WebSocket connection established");

    let writer_task = tokio::spawn(async move {
        while let Some(server_msg) = out_rx.recv().await {
            match serde_json::to_string(&server_msg) {
                Ok(json) => {
                    debug!(payload = %json, "sending WebSocket message");
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    error!(error = %err, "failed to serialize WebSocket message");
                    break;
                }
            }
        }
    });

    let event_task = tokio::spawn(forward_events(tracker.subscribe_events(), out_tx.clone()));

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                debug!(payload = %text, "received WebSocket client message");
                let response = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => handle_client_message(&tracker, client_msg).await,
                    Err(err) => ServerMessage::Error {
                        message: format!("invalid message: {err}"),
                    },
                };
                if out_tx.send(response).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "WebSocket receive error");
                break;
            }
        }
    }

    event_task.abort();
    drop(out_tx);
    if let Err(err) = writer_task.await {
        warn!(error = %err, "WebSocket writer task exited with join error");
    }

    info!("WebSocket connection closed");
}

/// 将跟踪器事件转发给连接，落后时通知客户端并继续，事件源关闭后结束。
async fn forward_events(mut event_stream: EventStream, out_tx: mpsc::Sender<ServerMessage>) {
    loop {
        let message = match event_stream.recv().await {
            Ok(event) => event_to_server_message(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "WebSocket client lagged behind task events");
                ServerMessage::Error {
                    message: format!("missed {skipped} task events, send list_tasks to resync"),
                }
            }
            Err(RecvError::Closed) => break,
        };
        if out_tx.send(message).await.is_err() {
            break;
        }
    }
}

async fn handle_client_message(tracker: &TaskTracker, msg: ClientMessage) -> ServerMessage {
    match msg {
        ClientMessage::ListTasks => {
            let tasks = tracker.list().await;
            debug!(count = tasks.len(), "prepared task_list response");
            ServerMessage::TaskList {
                tasks: tasks.into_iter().map(TaskInfoMessage::from).collect(),
            }
        }
        ClientMessage::RefreshStatus { task_id } => {
            let id = match TaskId::new(task_id) {
                Ok(id) => id,
                Err(err) => {
                    return ServerMessage::Error {
                        message: err.to_string(),
                    };
                }
            };

            match tracker.refresh(&id).await {
                Ok(status) => ServerMessage::TaskStatus {
                    task_id: id.into_inner(),
                    status,
                },
                Err(err) => ServerMessage::Error {
                    message: format!("refresh status failed: {err}"),
                },
            }
        }
        ClientMessage::ForgetTask { task_id } => {
            let id = match TaskId::new(task_id) {
                Ok(id) => id,
                Err(err) => {
                    return ServerMessage::Error {
                        message: err.to_string(),
                    };
                }
            };

            match tracker.forget(&id).await {
                Ok(_) => ServerMessage::TaskForgotten {
                    task_id: id.into_inner(),
                },
                Err(err) => ServerMessage::Error {
                    message: format!("forget task failed: {err}"),
                },
            }
        }
    }
}
