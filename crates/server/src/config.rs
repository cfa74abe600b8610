//! 服务配置加载。

use std::path::{Path, PathBuf};

use anyhow::Context;
use generation_client::GenerationClientConfig;
use serde::Deserialize;
use system_capabilities::FileSystemPolicy;
use tracing::{info, warn};

type Result<T> = anyhow::Result<T>;

/// 默认配置文件路径。
pub const DEFAULT_CONFIG_PATH: &str = "mapgen.toml";

/// 指定配置文件路径的环境变量。
pub const CONFIG_PATH_ENV: &str = "MAPGEN_CONFIG";

/// 覆盖后端地址的环境变量。
pub const BACKEND_URL_ENV: &str = "MAPGEN_BACKEND_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpConfig,
    #[serde(default)]
    pub backend: GenerationClientConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// 允许跨域访问的来源，空列表表示不限制。
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_template_extensions")]
    pub template_extensions: Vec<String>,
    #[serde(default = "default_validate_json")]
    pub validate_json: bool,
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to deserialize server config")
    }

    /// 从 `MAPGEN_CONFIG`（默认 `mapgen.toml`）加载配置并应用环境变量覆盖。
    ///
    /// 配置文件不存在时使用默认值。
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&path).exists() {
            info!(path = %path, "loading server config");
            Self::from_file(&path)?
        } else {
            warn!(path = %path, "config file not found, using defaults");
            Self::default()
        };

        config.apply_overrides(std::env::var(BACKEND_URL_ENV).ok());
        Ok(config)
    }

    pub fn apply_overrides(&mut self, backend_url: Option<String>) {
        if let Some(url) = backend_url.filter(|url| !url.trim().is_empty()) {
            info!(base_url = %url, "backend url overridden from environment");
            self.backend.base_url = url;
        }
    }

    pub fn templates_policy(&self) -> FileSystemPolicy {
        FileSystemPolicy {
            allowed_extensions: self.storage.template_extensions.clone(),
            max_file_bytes: self.storage.max_file_bytes,
            validate_json: self.storage.validate_json,
        }
    }

    /// 产物目录只允许浏览、下载与删除，不限制扩展名。
    pub fn artifacts_policy(&self) -> FileSystemPolicy {
        FileSystemPolicy {
            allowed_extensions: Vec::new(),
            max_file_bytes: self.storage.max_file_bytes,
            validate_json: false,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            artifacts_dir: default_artifacts_dir(),
            max_file_bytes: default_max_file_bytes(),
            template_extensions: default_template_extensions(),
            validate_json: default_validate_json(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("maps")
}

fn default_max_file_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_template_extensions() -> Vec<String> {
    vec!["json".to_string(), "yml".to_string(), "yaml".to_string()]
}

fn default_validate_json() -> bool {
    true
}
