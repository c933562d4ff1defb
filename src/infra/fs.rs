//! # File System Operations Module / 文件系统操作模块
//!
//! Resolves and reads the report artifacts a build leaves under its root.
//!
//! 解析并读取构建在其根目录下留下的报告产物。

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A report file could not be read.
#[derive(Debug, Error)]
#[error("failed to read report {}", path.display())]
pub struct ArtifactReadError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Resolves a report path against the build root. Absolute paths are kept.
pub fn resolve_artifact(build_root: &Path, report: &Path) -> PathBuf {
    if report.is_absolute() {
        report.to_path_buf()
    } else {
        build_root.join(report)
    }
}

/// Reads a report as text. Invalid UTF-8 is replaced rather than rejected.
///
/// 以文本形式读取报告。无效的 UTF-8 会被替换而不是拒绝。
pub async fn read_artifact(path: &Path) -> Result<String, ArtifactReadError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ArtifactReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}
