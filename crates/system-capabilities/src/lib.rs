//! System Capabilities - 系统能力封装模块。
//!
//! 该 crate 提供限定在根目录内的文件系统能力，供 server 集成为模板与产物 API 路由。

pub mod filesystem;
pub mod validation;

pub use filesystem::{
    DirectoryInfo, FileContent, FileSystemCapabilities, FileSystemEntry, FileSystemError,
    FileSystemPolicy, MAX_SEARCH_DEPTH, MAX_SEARCH_RESULTS, ResolvedFile, SearchOptions,
    SearchResult,
};
