//! 路径与文件名校验。
//!
//! 所有来自 API 的路径都是相对于沙箱根目录的相对路径，
//! 在拼接到根目录之前必须先经过这里的校验。

use std::path::Path;

use crate::filesystem::{FileSystemError, Result};

/// 相对路径最大长度（字节）。
pub const MAX_PATH_LEN: usize = 512;

/// 单个文件名最大长度（字节）。
pub const MAX_FILE_NAME_LEN: usize = 255;

/// 校验并规范化相对路径。
///
/// 返回以 `/` 分隔、去掉 `.` 与重复分隔符后的路径。
/// `allow_empty` 为真时空路径表示根目录。
pub fn validate_relative_path(raw: &str, allow_empty: bool) -> Result<String> {
    if raw.len() > MAX_PATH_LEN {
        return Err(FileSystemError::InvalidPath(format!(
            "path exceeds {MAX_PATH_LEN} bytes"
        )));
    }

    if raw.chars().any(char::is_control) {
        return Err(FileSystemError::InvalidPath(
            "path contains control characters".to_string(),
        ));
    }

    if raw.contains('\\') {
        return Err(FileSystemError::InvalidPath(format!(
            "backslashes are not allowed: {raw}"
        )));
    }

    if raw.starts_with('/') || has_drive_prefix(raw) {
        return Err(FileSystemError::InvalidPath(format!(
            "absolute paths are not allowed: {raw}"
        )));
    }

    let mut components = Vec::new();
    for component in raw.split('/') {
        match component {
            "" | "." => continue,
            ".." => return Err(FileSystemError::PathTraversal(raw.to_string())),
            name if name.starts_with('.') => {
                return Err(FileSystemError::InvalidPath(format!(
                    "hidden path components are not allowed: {name}"
                )));
            }
            name => {
                validate_file_name(name)?;
                components.push(name);
            }
        }
    }

    if components.is_empty() && !allow_empty {
        return Err(FileSystemError::InvalidPath("path is empty".to_string()));
    }

    Ok(components.join("/"))
}

fn has_drive_prefix(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// 校验单个文件名。
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_FILE_NAME_LEN {
        return Err(FileSystemError::InvalidPath(format!(
            "file name must be 1..={MAX_FILE_NAME_LEN} bytes"
        )));
    }

    if name.starts_with(' ') || name.ends_with(' ') {
        return Err(FileSystemError::InvalidPath(format!(
            "file name has leading or trailing spaces: {name:?}"
        )));
    }

    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.'));
    if !valid {
        return Err(FileSystemError::InvalidPath(format!(
            "file name contains unsupported characters: {name:?}"
        )));
    }

    Ok(())
}

/// 校验扩展名是否在允许列表中（不区分大小写）。空列表表示不限制。
pub fn validate_extension(path: &str, allowed: &[String]) -> Result<()> {
    if allowed.is_empty() {
        return Ok(());
    }

    let extension = Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    let permitted = extension.as_deref().is_some_and(|ext| {
        allowed
            .iter()
            .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(ext))
    });

    if permitted {
        Ok(())
    } else {
        Err(FileSystemError::UnsupportedExtension(path.to_string()))
    }
}
