//! 统一的应用状态。

use std::sync::Arc;

use anyhow::Context;
use generation_client::{HttpGenerationBackend, TaskTracker};
use system_capabilities::FileSystemCapabilities;

use crate::config::ServerConfig;

/// 统一的应用状态，包含所有服务共享的数据。
#[derive(Clone)]
pub struct AppState {
    /// 生成任务跟踪器。
    pub tracker: TaskTracker,
    /// 模板与 schema 目录。
    pub templates: FileSystemCapabilities,
    /// 生成产物目录。
    pub artifacts: FileSystemCapabilities,
}

impl AppState {
    /// 创建新的应用状态。
    pub fn new(
        tracker: TaskTracker,
        templates: FileSystemCapabilities,
        artifacts: FileSystemCapabilities,
    ) -> Self {
        Self {
            tracker,
            templates,
            artifacts,
        }
    }

    /// 根据配置构建 HTTP 后端客户端与文件系统沙箱。
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let backend = HttpGenerationBackend::new(&config.backend)
            .context("failed to build generation backend client")?;
        let tracker = TaskTracker::new(Arc::new(backend), &config.backend);

        let templates =
            FileSystemCapabilities::new(&config.storage.templates_dir, config.templates_policy())
                .context("failed to open templates directory")?;
        let artifacts =
            FileSystemCapabilities::new(&config.storage.artifacts_dir, config.artifacts_policy())
                .context("failed to open artifacts directory")?;

        Ok(Self::new(tracker, templates, artifacts))
    }
}
