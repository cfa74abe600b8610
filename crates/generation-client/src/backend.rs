//! 生成后端 HTTP 客户端。
//!
//! 通过 HTTP API 与外部地图生成服务交互：提交生成任务、查询任务状态。

use async_trait::async_trait;
use mapgen_core::{BackendError, GenerationBackend, GenerationPayload, TaskId, TaskState, TaskStatus};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{GenerationClientConfig, Result};

/// 提交任务的端点。
pub const GENERATE_PATH: &str = "/map/generate";

/// 查询任务状态的端点。
pub const TASK_STATUS_PATH: &str = "/info/task_status";

/// 基于 reqwest 的生成后端实现。
#[derive(Debug, Clone)]
pub struct HttpGenerationBackend {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    task_id: String,
}

#[derive(Debug, Serialize)]
struct TaskStatusRequest<'a> {
    task_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct TaskStatusResponse {
    status: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "queue_position")]
    position: Option<u32>,
}

impl HttpGenerationBackend {
    /// 根据配置创建客户端。
    pub fn new(config: &GenerationClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        info!(base_url = %config.base_url, "generation backend client ready");

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let builder = self.client.post(format!("{}{}", self.base_url, path));
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> std::result::Result<Response, BackendError> {
        builder.send().await.map_err(transport_error)
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Unavailable(err.to_string())
    }
}

async fn rejected(response: Response) -> BackendError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|err| format!("<unreadable body: {err}>"));
    warn!(status, message = %message, "generation backend rejected request");
    BackendError::Rejected { status, message }
}

#[async_trait]
impl GenerationBackend for HttpGenerationBackend {
    async fn submit(&self, payload: &GenerationPayload) -> std::result::Result<TaskId, BackendError> {
        info!(
            game = %payload.game_code,
            coordinates = %payload.coordinates,
            size = payload.size,
            "submitting generation task"
        );

        let response = self.send(self.post(GENERATE_PATH).json(payload)).await?;
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|err| BackendError::InvalidResponse(err.to_string()))?;
        let task_id = TaskId::new(body.task_id)
            .map_err(|err| BackendError::InvalidResponse(err.to_string()))?;

        info!(task_id = %task_id, "generation task accepted");
        Ok(task_id)
    }

    async fn task_status(&self, task_id: &TaskId) -> std::result::Result<TaskStatus, BackendError> {
        let request = TaskStatusRequest {
            task_id: task_id.as_str(),
        };
        let response = self.send(self.post(TASK_STATUS_PATH).json(&request)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BackendError::TaskNotFound(task_id.clone()));
        }
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let body: TaskStatusResponse = response
            .json()
            .await
            .map_err(|err| BackendError::InvalidResponse(err.to_string()))?;
        let state: TaskState = body
            .status
            .parse()
            .map_err(|err: mapgen_core::DomainError| BackendError::InvalidResponse(err.to_string()))?;

        debug!(task_id = %task_id, state = %state, "task status received");
        Ok(TaskStatus {
            state,
            description: body.description.filter(|d| !d.is_empty()),
            queue_position: body.position,
        })
    }
}
