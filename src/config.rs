//! 程序配置
//!
//! 加载顺序（后者覆盖前者）：默认值 → TOML 配置文件（可选）→ `.env` / 进程环境变量。
//! 配置在启动时构造一次，之后以引用形式传给编排层和写入服务，不存在全局状态。

use crate::error::{AppError, AppResult, ConfigError, FileError};
use crate::models::schema;
use crate::services::RetryPolicy;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Landing AI 文档分析接口
pub const DEFAULT_API_URL: &str = "https://api.va.landing.ai/v1/tools/agentic-document-analysis";
/// 默认配置文件
pub const DEFAULT_CONFIG_FILE: &str = "catalog_ocr.toml";

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 文档 AI 服务的 API Key
    pub api_key: String,
    /// 文档 AI 服务地址
    pub api_url: String,
    /// 源 PDF 所在目录
    pub pdf_base_path: Option<String>,
    /// 源 PDF 文件名
    pub pdf_name: Option<String>,
    /// 同时处理的页面数量
    pub max_workers: usize,
    /// 输出根目录
    pub output_dir: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 单页最多尝试次数（1 表示不重试）
    pub max_attempts: u32,
    /// 重试间隔（毫秒）
    pub retry_backoff_ms: u64,
    /// 自定义抽取 schema 文件（JSON）
    pub schema_path: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            pdf_base_path: None,
            pdf_name: None,
            max_workers: 4,
            output_dir: "output".to_string(),
            request_timeout_secs: 120,
            max_attempts: 1,
            retry_backoff_ms: 1000,
            schema_path: None,
            verbose_logging: false,
        }
    }
}

/// TOML 配置文件的内容，所有字段可选
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_key: Option<String>,
    api_url: Option<String>,
    pdf_base_path: Option<String>,
    pdf_name: Option<String>,
    max_workers: Option<usize>,
    output_dir: Option<String>,
    request_timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
    retry_backoff_ms: Option<u64>,
    schema_path: Option<String>,
    verbose_logging: Option<bool>,
}

impl Config {
    /// 从 `.env`、配置文件和环境变量加载配置
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let config_file = std::env::var("CATALOG_OCR_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let mut config = Self::default();
        if Path::new(&config_file).exists() {
            config.merge_file(&config_file)?;
        }

        config.merge_vars(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 合并 TOML 配置文件
    pub fn merge_file(&mut self, path: &str) -> AppResult<()> {
        let content =
            std::fs::read_to_string(path).map_err(|e| AppError::file_read_failed(path, e))?;
        let file: FileConfig = toml::from_str(&content).map_err(|e| {
            AppError::File(FileError::TomlParseFailed {
                path: path.to_string(),
                source: Box::new(e),
            })
        })?;

        if let Some(v) = file.api_key {
            self.api_key = v;
        }
        if let Some(v) = file.api_url {
            self.api_url = v;
        }
        if file.pdf_base_path.is_some() {
            self.pdf_base_path = file.pdf_base_path;
        }
        if file.pdf_name.is_some() {
            self.pdf_name = file.pdf_name;
        }
        if let Some(v) = file.max_workers {
            self.max_workers = v;
        }
        if let Some(v) = file.output_dir {
            self.output_dir = v;
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file.max_attempts {
            self.max_attempts = v;
        }
        if let Some(v) = file.retry_backoff_ms {
            self.retry_backoff_ms = v;
        }
        if file.schema_path.is_some() {
            self.schema_path = file.schema_path;
        }
        if let Some(v) = file.verbose_logging {
            self.verbose_logging = v;
        }
        Ok(())
    }

    /// 用变量查找函数覆盖配置（`from_env` 传入 `std::env::var`，测试传入 map）
    pub fn merge_vars<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("VISION_AGENT_API_KEY") {
            self.api_key = v;
        }
        if let Some(v) = lookup("VISION_AGENT_API_URL") {
            self.api_url = v;
        }
        if let Some(v) = lookup("BASE_PDF_PATH") {
            self.pdf_base_path = Some(v);
        }
        if let Some(v) = lookup("PDF_NAME") {
            self.pdf_name = Some(v);
        }
        if let Some(v) = lookup("OUTPUT_DIR") {
            self.output_dir = v;
        }
        if let Some(v) = lookup("SCHEMA_PATH") {
            self.schema_path = Some(v);
        }
        parse_var(&lookup, "MAX_WORKERS", "usize", &mut self.max_workers)?;
        parse_var(&lookup, "REQUEST_TIMEOUT_SECS", "u64", &mut self.request_timeout_secs)?;
        parse_var(&lookup, "MAX_ATTEMPTS", "u32", &mut self.max_attempts)?;
        parse_var(&lookup, "RETRY_BACKOFF_MS", "u64", &mut self.retry_backoff_ms)?;
        parse_var(&lookup, "VERBOSE_LOGGING", "bool", &mut self.verbose_logging)?;
        Ok(())
    }

    /// 校验必填项并修正下限
    pub fn validate(&mut self) -> AppResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::env_var_not_found("VISION_AGENT_API_KEY"));
        }
        self.max_workers = self.max_workers.max(1);
        self.max_attempts = self.max_attempts.max(1);
        Ok(())
    }

    /// 源 PDF 完整路径：`<BASE_PDF_PATH>/<PDF_NAME>`
    pub fn source_pdf_path(&self) -> AppResult<PathBuf> {
        let base = self
            .pdf_base_path
            .as_deref()
            .ok_or_else(|| AppError::env_var_not_found("BASE_PDF_PATH"))?;
        let name = self
            .pdf_name
            .as_deref()
            .ok_or_else(|| AppError::env_var_not_found("PDF_NAME"))?;
        Ok(Path::new(base).join(name))
    }

    /// 单次请求超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    /// 加载抽取 schema：优先使用 `schema_path`，否则使用内置的商品目录 schema
    pub fn load_schema(&self) -> AppResult<Value> {
        let Some(path) = self.schema_path.as_deref() else {
            return Ok(schema::product_catalog_schema());
        };

        let content =
            std::fs::read_to_string(path).map_err(|e| AppError::file_read_failed(path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            AppError::Config(ConfigError::InvalidSchema {
                path: path.to_string(),
                reason: e.to_string(),
            })
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, expected_type: &str, slot: &mut T) -> AppResult<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(name) {
        *slot = raw.trim().parse().map_err(|_| {
            AppError::Config(ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value: raw.clone(),
                expected_type: expected_type.to_string(),
            })
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_match_original_tool() {
        let config = Config::default();
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.output_dir, "output");
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_vars_override_defaults() {
        let mut config = Config::default();
        config
            .merge_vars(lookup_from(&[
                ("VISION_AGENT_API_KEY", "secret"),
                ("BASE_PDF_PATH", "/data"),
                ("PDF_NAME", "catalog.pdf"),
                ("MAX_WORKERS", "8"),
            ]))
            .unwrap();
        config.validate().unwrap();

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.max_workers, 8);
        assert_eq!(
            config.source_pdf_path().unwrap(),
            PathBuf::from("/data/catalog.pdf")
        );
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let mut config = Config::default();
        config.merge_vars(lookup_from(&[])).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("VISION_AGENT_API_KEY"));
    }

    #[test]
    fn test_bad_number_reports_variable() {
        let mut config = Config::default();
        let err = config
            .merge_vars(lookup_from(&[("MAX_WORKERS", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("MAX_WORKERS"));
    }

    #[test]
    fn test_worker_count_has_floor_of_one() {
        let mut config = Config {
            api_key: "k".to_string(),
            max_workers: 0,
            max_attempts: 0,
            ..Config::default()
        };
        config.validate().unwrap();
        assert_eq!(config.max_workers, 1);
        assert_eq!(config.retry_policy().max_attempts, 1);
    }

    #[test]
    fn test_missing_pdf_name() {
        let config = Config {
            pdf_base_path: Some("/data".to_string()),
            ..Config::default()
        };
        assert!(config.source_pdf_path().is_err());
    }

    #[test]
    fn test_toml_file_is_merged_then_vars_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog_ocr.toml");
        std::fs::write(
            &path,
            "api_key = \"from-file\"\nmax_workers = 2\noutput_dir = \"runs\"\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.merge_file(path.to_str().unwrap()).unwrap();
        config
            .merge_vars(lookup_from(&[("MAX_WORKERS", "6")]))
            .unwrap();

        assert_eq!(config.api_key, "from-file");
        assert_eq!(config.output_dir, "runs");
        assert_eq!(config.max_workers, 6);
    }

    #[test]
    fn test_builtin_schema_used_without_path() {
        let schema = Config::default().load_schema().unwrap();
        assert!(schema["properties"]["products"].is_object());
    }
}
