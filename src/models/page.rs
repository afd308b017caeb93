//! 页面相关数据结构
//!
//! - `SourceDocument`：原始多页 PDF，只读
//! - `PageArtifact`：拆分出的单页 PDF，持有临时文件，Drop 时自动删除
//! - `PageResult`：单页处理结果（成功或失败都是数据）

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Local};
use serde_json::Value;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// 原始 PDF 文档
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// 文件路径（内存文档为名称）
    pub path: PathBuf,
    bytes: Vec<u8>,
}

impl SourceDocument {
    /// 从磁盘读取
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::invalid_document(
                path.display().to_string(),
                "文件不存在",
            ));
        }
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::invalid_document(path.display().to_string(), e))?;
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
        })
    }

    /// 从内存字节构造
    pub fn from_bytes(name: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: name.into(),
            bytes,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 文件名（用于上传和日志）
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

/// 单页 PDF
///
/// 临时文件由 `NamedTempFile` 持有，artifact 被 drop 时删除。
/// 处理成功、失败、任务 panic 或被中止，都会走到 drop。
#[derive(Debug)]
pub struct PageArtifact {
    /// 页码（从 1 开始）
    pub page_index: u32,
    file_name: String,
    bytes: Vec<u8>,
    temp_file: NamedTempFile,
}

impl PageArtifact {
    /// 写入临时文件并创建 artifact
    pub fn new(page_index: u32, file_name: impl Into<String>, bytes: Vec<u8>) -> AppResult<Self> {
        let mut temp_file = tempfile::Builder::new()
            .prefix(&format!("page-{:03}-", page_index))
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| AppError::file_write_failed("<temp>", e))?;

        let temp_path = temp_file.path().display().to_string();
        temp_file
            .write_all(&bytes)
            .and_then(|_| temp_file.flush())
            .map_err(|e| AppError::file_write_failed(temp_path, e))?;

        Ok(Self {
            page_index,
            file_name: file_name.into(),
            bytes,
            temp_file,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// 临时文件路径
    pub fn temp_path(&self) -> &Path {
        self.temp_file.path()
    }
}

/// 页面处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Success,
    Error,
}

impl PageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PageStatus::Success => "SUCCESS",
            PageStatus::Error => "ERROR",
        }
    }
}

/// 单页错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 网络错误（连接失败、传输中断）
    NetworkError,
    /// 接口返回 4xx/5xx
    ApiError,
    /// 响应无法解析
    MalformedResponse,
    /// 请求超时
    Timeout,
    /// 工作任务异常退出
    WorkerFailed,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NetworkError => "NetworkError",
            ErrorKind::ApiError => "ApiError",
            ErrorKind::MalformedResponse => "MalformedResponse",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::WorkerFailed => "WorkerFailed",
        }
    }

    /// 是否属于可重试的瞬时错误
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorKind::NetworkError | ErrorKind::Timeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单页错误详情
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageError {
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// 单页处理结果
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    /// 页码（从 1 开始）
    pub page_index: u32,
    pub status: PageStatus,
    /// 接口原始返回（成功时）
    pub payload: Option<Value>,
    /// 错误详情（失败时）
    pub error: Option<PageError>,
    /// 实际请求次数
    pub attempts: u32,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl PageResult {
    pub fn success(page_index: u32, payload: Value, started_at: DateTime<Local>) -> Self {
        Self {
            page_index,
            status: PageStatus::Success,
            payload: Some(payload),
            error: None,
            attempts: 1,
            started_at,
            finished_at: Local::now(),
        }
    }

    pub fn failure(
        page_index: u32,
        kind: ErrorKind,
        message: impl Into<String>,
        started_at: DateTime<Local>,
    ) -> Self {
        Self {
            page_index,
            status: PageStatus::Error,
            payload: None,
            error: Some(PageError {
                kind,
                message: message.into(),
            }),
            attempts: 1,
            started_at,
            finished_at: Local::now(),
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == PageStatus::Success
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// 抽取到的商品列表（payload 中的 `products` 数组）
    pub fn products(&self) -> &[Value] {
        self.payload
            .as_ref()
            .and_then(|p| p.get("products"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 处理耗时（毫秒）
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
