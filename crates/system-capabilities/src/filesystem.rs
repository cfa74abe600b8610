//! 文件系统能力模块。
//!
//! 提供限定在单个根目录（沙箱）内的目录浏览、文件读写、重命名、删除、复制与搜索能力。

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::validation::{validate_extension, validate_relative_path};

/// 文件系统错误类型。
#[derive(Debug, Error)]
pub enum FileSystemError {
    #[error("路径不存在: {0}")]
    PathNotFound(String),

    #[error("路径不是目录: {0}")]
    NotADirectory(String),

    #[error("路径不是文件: {0}")]
    NotAFile(String),

    #[error("路径已存在: {0}")]
    AlreadyExists(String),

    #[error("目录非空: {0}")]
    DirectoryNotEmpty(String),

    #[error("非法路径: {0}")]
    InvalidPath(String),

    #[error("路径越界: {0}")]
    PathTraversal(String),

    #[error("不支持的文件类型: {0}")]
    UnsupportedExtension(String),

    #[error("文件内容无效: {0}")]
    InvalidContent(String),

    #[error("文件过大: {size} 字节，上限 {limit} 字节")]
    TooLarge { size: u64, limit: u64 },

    #[error("权限不足: {0}")]
    PermissionDenied(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FileSystemError>;

/// 文件/目录信息，路径相对于沙箱根目录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSystemEntry {
    /// 名称。
    pub name: String,
    /// 相对路径。
    pub path: String,
    /// 是否为目录。
    pub is_dir: bool,
    /// 是否为文件。
    pub is_file: bool,
    /// 文件大小（字节），仅对文件有效。
    pub size: Option<u64>,
    /// 修改时间（Unix 时间戳）。
    pub modified: Option<u64>,
    /// 文件扩展名（小写）。
    pub extension: Option<String>,
}

/// 目录详细内容信息。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryInfo {
    /// 目录相对路径，根目录为空字符串。
    pub path: String,
    /// 目录名称。
    pub name: String,
    /// 父目录相对路径，根目录没有父目录。
    pub parent: Option<String>,
    /// 子目录列表。
    pub directories: Vec<FileSystemEntry>,
    /// 文件列表。
    pub files: Vec<FileSystemEntry>,
    /// 是否可以访问（权限）。
    pub accessible: bool,
}

/// 文本文件内容。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub content: String,
    pub size: u64,
    pub modified: Option<u64>,
}

/// 已解析的可下载文件。
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    /// 绝对路径。
    pub absolute: PathBuf,
    /// 文件名。
    pub name: String,
    /// 文件大小（字节）。
    pub size: u64,
}

/// 文件搜索选项。
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// 搜索模式（glob 格式）。
    pub pattern: String,
    /// 是否递归搜索。
    pub recursive: bool,
    /// 最大搜索深度，超过 [`MAX_SEARCH_DEPTH`] 时截断。
    pub max_depth: usize,
    /// 最大结果数量，超过 [`MAX_SEARCH_RESULTS`] 时截断。
    pub max_results: usize,
}

/// 搜索深度上限。
pub const MAX_SEARCH_DEPTH: usize = 32;

/// 单次搜索返回结果的上限。
pub const MAX_SEARCH_RESULTS: usize = 1000;

/// 搜索结果。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// 匹配的文件列表。
    pub files: Vec<FileSystemEntry>,
    /// 总匹配数（可能被截断）。
    pub total: usize,
    /// 是否被截断。
    pub truncated: bool,
}

/// 写入与校验策略。
#[derive(Debug, Clone)]
pub struct FileSystemPolicy {
    /// 允许写入的扩展名，空列表表示不限制。
    pub allowed_extensions: Vec<String>,
    /// 单个文件的最大字节数。
    pub max_file_bytes: u64,
    /// 写入 `.json` 文件前是否校验 JSON 语法。
    pub validate_json: bool,
}

impl Default for FileSystemPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: Vec::new(),
            max_file_bytes: 5 * 1024 * 1024,
            validate_json: true,
        }
    }
}

/// 文件系统能力接口。
///
/// 所有操作都以相对路径表示，解析后必须仍位于根目录之内，
/// 包括通过符号链接跳出根目录的情况。
#[derive(Debug, Clone)]
pub struct FileSystemCapabilities {
    /// 规范化后的根目录。
    root: PathBuf,
    policy: FileSystemPolicy,
}

impl FileSystemCapabilities {
    /// 创建绑定到 `root` 的实例，根目录不存在时自动创建。
    pub fn new(root: impl AsRef<Path>, policy: FileSystemPolicy) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)
            .with_context(|| format!("failed to create root directory: {}", root.display()))?;
        let root = root
            .canonicalize()
            .with_context(|| format!("failed to canonicalize root: {}", root.display()))?;

        info!(root = %root.display(), "file system capability ready");
        Ok(Self { root, policy })
    }

    /// 根目录的绝对路径。
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy(&self) -> &FileSystemPolicy {
        &self.policy
    }

    /// 校验相对路径并解析为根目录下的绝对路径。
    fn resolve(&self, raw: &str, allow_empty: bool) -> Result<(String, PathBuf)> {
        let relative = validate_relative_path(raw, allow_empty)?;
        let absolute = if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&relative)
        };
        self.ensure_inside_root(&absolute, &relative)?;
        Ok((relative, absolute))
    }

    /// 检查路径（或其最深的已存在祖先）规范化后仍在根目录内。
    fn ensure_inside_root(&self, absolute: &Path, relative: &str) -> Result<()> {
        let mut probe = absolute.to_path_buf();
        while probe.symlink_metadata().is_err() {
            if !probe.pop() {
                return Err(FileSystemError::PermissionDenied(relative.to_string()));
            }
        }

        let canonical = probe
            .canonicalize()
            .map_err(|_| FileSystemError::PermissionDenied(relative.to_string()))?;

        if canonical.starts_with(&self.root) {
            Ok(())
        } else {
            Err(FileSystemError::PermissionDenied(relative.to_string()))
        }
    }

    /// 列出目录内容。
    pub fn list_directory(&self, path: &str) -> Result<DirectoryInfo> {
        let (relative, absolute) = self.resolve(path, true)?;

        if !absolute.exists() {
            return Err(FileSystemError::PathNotFound(relative));
        }

        if !absolute.is_dir() {
            return Err(FileSystemError::NotADirectory(relative));
        }

        info!(path = %relative, "Listing directory");

        let name = Path::new(&relative)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let parent = if relative.is_empty() {
            None
        } else {
            Some(parent_of(&relative))
        };

        let mut directories = Vec::new();
        let mut files = Vec::new();
        let mut accessible = true;

        match std::fs::read_dir(&absolute) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let file_name = entry.file_name().to_string_lossy().to_string();
                    // 隐藏文件不可通过 API 访问，因此也不列出
                    if file_name.starts_with('.') {
                        continue;
                    }
                    let entry_relative = join_relative(&relative, &file_name);
                    // 指向根目录之外的符号链接不列出
                    if self.ensure_inside_root(&entry.path(), &entry_relative).is_err() {
                        continue;
                    }
                    if let Ok(info) = entry_info(&entry.path(), entry_relative) {
                        if info.is_dir {
                            directories.push(info);
                        } else {
                            files.push(info);
                        }
                    }
                }
            }
            Err(e) => {
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    accessible = false;
                }
            }
        }

        directories.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        files.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        Ok(DirectoryInfo {
            path: relative,
            name,
            parent,
            directories,
            files,
            accessible,
        })
    }

    /// 读取 UTF-8 文本文件。
    pub fn read_text(&self, path: &str) -> Result<FileContent> {
        let (relative, absolute) = self.resolve(path, false)?;
        let metadata = self.file_metadata(&absolute, &relative)?;
        self.check_size(metadata.len())?;

        let bytes = std::fs::read(&absolute)?;
        let content = String::from_utf8(bytes).map_err(|_| {
            FileSystemError::InvalidContent(format!("{relative} is not valid UTF-8"))
        })?;

        debug!(path = %relative, size = metadata.len(), "read file");
        Ok(FileContent {
            path: relative,
            content,
            size: metadata.len(),
            modified: modified_secs(&metadata),
        })
    }

    /// 解析一个已存在的普通文件，供下载流式读取。
    pub fn resolve_file(&self, path: &str) -> Result<ResolvedFile> {
        let (relative, absolute) = self.resolve(path, false)?;
        let metadata = self.file_metadata(&absolute, &relative)?;
        let name = absolute
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(ResolvedFile {
            absolute,
            name,
            size: metadata.len(),
        })
    }

    /// 写入文本文件。
    ///
    /// 内容先写入同目录下的临时文件，再原子地重命名到目标位置。
    pub fn write_file(&self, path: &str, content: &str, overwrite: bool) -> Result<FileSystemEntry> {
        let (relative, absolute) = self.resolve(path, false)?;
        validate_extension(&relative, &self.policy.allowed_extensions)?;
        self.check_size(content.len() as u64)?;

        if self.policy.validate_json && has_extension(&relative, "json") {
            serde_json::from_str::<serde_json::Value>(content).map_err(|err| {
                FileSystemError::InvalidContent(format!("{relative} is not valid JSON: {err}"))
            })?;
        }

        if let Ok(metadata) = absolute.symlink_metadata() {
            if metadata.is_dir() {
                return Err(FileSystemError::NotAFile(relative));
            }
            if !overwrite {
                return Err(FileSystemError::AlreadyExists(relative));
            }
        }

        let parent = absolute
            .parent()
            .ok_or_else(|| FileSystemError::InvalidPath(relative.clone()))?;
        std::fs::create_dir_all(parent)?;

        // 临时文件名与目标名长度无关，失败时随 drop 删除
        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(content.as_bytes())?;
        temp.persist(&absolute).map_err(|err| err.error)?;

        info!(path = %relative, bytes = content.len(), overwrite, "wrote file");
        entry_info(&absolute, relative)
    }

    /// 重命名文件或目录。目标不得已存在。
    pub fn rename(&self, from: &str, to: &str) -> Result<FileSystemEntry> {
        let (from_relative, from_absolute) = self.resolve(from, false)?;
        let (to_relative, to_absolute) = self.resolve(to, false)?;

        let metadata = from_absolute
            .symlink_metadata()
            .map_err(|_| FileSystemError::PathNotFound(from_relative.clone()))?;

        if to_absolute.symlink_metadata().is_ok() {
            return Err(FileSystemError::AlreadyExists(to_relative));
        }

        if metadata.is_dir() {
            if is_same_or_descendant(&to_relative, &from_relative) {
                return Err(FileSystemError::InvalidPath(format!(
                    "cannot move {from_relative} into itself"
                )));
            }
        } else {
            validate_extension(&to_relative, &self.policy.allowed_extensions)?;
        }

        if let Some(parent) = to_absolute.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(&from_absolute, &to_absolute)?;

        info!(from = %from_relative, to = %to_relative, "renamed path");
        entry_info(&to_absolute, to_relative)
    }

    /// 删除文件或目录。非空目录需要 `recursive`，根目录不可删除。
    pub fn delete(&self, path: &str, recursive: bool) -> Result<()> {
        let (relative, absolute) = self.resolve(path, false)?;

        let metadata = absolute
            .symlink_metadata()
            .map_err(|_| FileSystemError::PathNotFound(relative.clone()))?;

        if metadata.is_dir() {
            let is_empty = std::fs::read_dir(&absolute)?.next().is_none();
            if is_empty {
                std::fs::remove_dir(&absolute)?;
            } else if recursive {
                std::fs::remove_dir_all(&absolute)?;
            } else {
                return Err(FileSystemError::DirectoryNotEmpty(relative));
            }
        } else {
            std::fs::remove_file(&absolute)?;
        }

        info!(path = %relative, recursive, "deleted path");
        Ok(())
    }

    /// 复制普通文件。目标不得已存在。
    pub fn copy_file(&self, from: &str, to: &str) -> Result<FileSystemEntry> {
        let (from_relative, from_absolute) = self.resolve(from, false)?;
        let (to_relative, to_absolute) = self.resolve(to, false)?;

        let metadata = self.file_metadata(&from_absolute, &from_relative)?;
        self.check_size(metadata.len())?;
        validate_extension(&to_relative, &self.policy.allowed_extensions)?;

        if to_absolute.symlink_metadata().is_ok() {
            return Err(FileSystemError::AlreadyExists(to_relative));
        }

        if let Some(parent) = to_absolute.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&from_absolute, &to_absolute)?;

        info!(from = %from_relative, to = %to_relative, "copied file");
        entry_info(&to_absolute, to_relative)
    }

    /// 创建目录（包括缺失的父目录）。
    pub fn create_directory(&self, path: &str) -> Result<FileSystemEntry> {
        let (relative, absolute) = self.resolve(path, false)?;

        if absolute.symlink_metadata().is_ok() {
            return Err(FileSystemError::AlreadyExists(relative));
        }

        std::fs::create_dir_all(&absolute)?;
        info!(path = %relative, "created directory");
        entry_info(&absolute, relative)
    }

    /// 在指定目录下搜索文件。
    pub fn search_files(&self, base_path: &str, options: &SearchOptions) -> Result<SearchResult> {
        let (base_relative, base) = self.resolve(base_path, true)?;

        if !base.is_dir() {
            return Err(FileSystemError::PathNotFound(base_relative));
        }

        info!(base = %base_relative, pattern = %options.pattern, "Searching files");

        let pattern = glob::Pattern::new(&options.pattern)
            .with_context(|| format!("Invalid glob pattern: {}", options.pattern))
            .map_err(|err| FileSystemError::InvalidPath(format!("{err:#}")))?;

        let max_depth = if options.recursive {
            options.max_depth.clamp(1, MAX_SEARCH_DEPTH)
        } else {
            1
        };
        let max_results = options.max_results.min(MAX_SEARCH_RESULTS);

        let mut files = Vec::new();
        let mut total = 0;

        let walker = WalkDir::new(&base)
            .min_depth(1)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker.flatten() {
            let path = entry.path();
            let Ok(within_base) = path.strip_prefix(&base) else {
                continue;
            };

            if !pattern.matches_path(within_base) && !pattern.matches(&entry.file_name().to_string_lossy()) {
                continue;
            }

            let relative = join_relative(
                &base_relative,
                &within_base.to_string_lossy().replace('\\', "/"),
            );
            if self.ensure_inside_root(path, &relative).is_err() {
                continue;
            }

            total += 1;
            if files.len() >= max_results {
                continue;
            }

            if let Ok(info) = entry_info(path, relative) {
                files.push(info);
            }
        }

        let truncated = total > files.len();
        Ok(SearchResult {
            files,
            total,
            truncated,
        })
    }

    fn file_metadata(&self, absolute: &Path, relative: &str) -> Result<std::fs::Metadata> {
        let metadata = std::fs::metadata(absolute)
            .map_err(|_| FileSystemError::PathNotFound(relative.to_string()))?;
        if !metadata.is_file() {
            return Err(FileSystemError::NotAFile(relative.to_string()));
        }
        Ok(metadata)
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size > self.policy.max_file_bytes {
            return Err(FileSystemError::TooLarge {
                size,
                limit: self.policy.max_file_bytes,
            });
        }
        Ok(())
    }
}

/// 将路径转换为信息结构。
fn entry_info(absolute: &Path, relative: String) -> Result<FileSystemEntry> {
    let metadata = std::fs::metadata(absolute)?;

    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let extension = if metadata.is_file() {
        absolute
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    } else {
        None
    };

    Ok(FileSystemEntry {
        name,
        path: relative,
        is_dir: metadata.is_dir(),
        is_file: metadata.is_file(),
        size: if metadata.is_file() {
            Some(metadata.len())
        } else {
            None
        },
        modified: modified_secs(&metadata),
        extension,
    })
}

fn modified_secs(metadata: &std::fs::Metadata) -> Option<u64> {
    metadata.modified().ok().and_then(|t| {
        t.duration_since(std::time::UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs())
    })
}

fn join_relative(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

fn parent_of(relative: &str) -> String {
    relative
        .rsplit_once('/')
        .map(|(parent, _)| parent.to_string())
        .unwrap_or_default()
}

fn has_extension(relative: &str, extension: &str) -> bool {
    Path::new(relative)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

fn is_same_or_descendant(candidate: &str, ancestor: &str) -> bool {
    candidate == ancestor || candidate.starts_with(&format!("{ancestor}/"))
}
