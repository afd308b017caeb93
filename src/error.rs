use std::fmt;

/// 应用程序错误类型
///
/// 只描述会中止整次运行的错误；单页失败以 `PageResult` 数据形式记录，不走这里
#[derive(Debug)]
pub enum AppError {
    /// 源文档错误
    Document(DocumentError),
    /// 文件操作错误
    File(FileError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Document(e) => write!(f, "文档错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Document(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 源文档错误
#[derive(Debug)]
pub enum DocumentError {
    /// 无法解析为 PDF
    InvalidDocument { path: String, reason: String },
    /// PDF 没有任何页面
    EmptyDocument { path: String },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::InvalidDocument { path, reason } => {
                write!(f, "无法解析 PDF ({}): {}", path, reason)
            }
            DocumentError::EmptyDocument { path } => write!(f, "PDF 没有任何页面: {}", path),
        }
    }
}

impl std::error::Error for DocumentError {}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建目录失败
    CreateDirFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::CreateDirFailed { path, source } => {
                write!(f, "创建目录失败 ({}): {}", path, source)
            }
            FileError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::WriteFailed { source, .. }
            | FileError::CreateDirFailed { source, .. }
            | FileError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 环境变量不存在
    EnvVarNotFound { var_name: String },
    /// 抽取 schema 无效
    InvalidSchema { path: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
            ConfigError::EnvVarNotFound { var_name } => {
                write!(f, "环境变量 {} 不存在，请在 .env 文件或环境中设置", var_name)
            }
            ConfigError::InvalidSchema { path, reason } => {
                write!(f, "schema 文件无效 ({}): {}", path, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON 序列化失败: {}", err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建无效文档错误
    pub fn invalid_document(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        AppError::Document(DocumentError::InvalidDocument {
            path: path.into(),
            reason: reason.to_string(),
        })
    }

    /// 创建空文档错误
    pub fn empty_document(path: impl Into<String>) -> Self {
        AppError::Document(DocumentError::EmptyDocument { path: path.into() })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建目录创建错误
    pub fn create_dir_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::CreateDirFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建环境变量缺失错误
    pub fn env_var_not_found(var_name: impl Into<String>) -> Self {
        AppError::Config(ConfigError::EnvVarNotFound {
            var_name: var_name.into(),
        })
    }

    /// 是否为源文档错误（运行前即失败，不会派发任何页面）
    pub fn is_document_error(&self) -> bool {
        matches!(self, AppError::Document(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
