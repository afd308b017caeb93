/// 文档 AI 客户端
///
/// 封装与 Landing AI 文档分析接口的交互：上传单页 PDF 和抽取 schema，取回结构化结果
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::ErrorKind;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// 单次抽取调用的错误
#[derive(Debug, Error)]
pub enum ExtractError {
    /// 请求超时
    #[error("请求超时: {0}")]
    Timeout(String),
    /// 网络错误
    #[error("网络请求失败: {0}")]
    Network(String),
    /// 接口返回非 2xx
    #[error("API返回错误响应 ({status}): {message}")]
    Api { status: u16, message: String },
    /// 响应体无法解析
    #[error("响应格式错误: {0}")]
    Malformed(String),
}

impl ExtractError {
    /// 对应的单页错误类型
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::Timeout(_) => ErrorKind::Timeout,
            ExtractError::Network(_) => ErrorKind::NetworkError,
            ExtractError::Api { .. } => ErrorKind::ApiError,
            ExtractError::Malformed(_) => ErrorKind::MalformedResponse,
        }
    }
}

impl From<reqwest::Error> for ExtractError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExtractError::Timeout(err.to_string())
        } else if err.is_decode() {
            ExtractError::Malformed(err.to_string())
        } else {
            ExtractError::Network(err.to_string())
        }
    }
}

/// 文档抽取能力
///
/// 只负责"一页 PDF 进，一份结构化结果出"，不关心页码和批次
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(
        &self,
        file_name: &str,
        pdf: &[u8],
        schema: &Value,
    ) -> Result<Value, ExtractError>;
}

/// 文档 AI 客户端
pub struct DocumentAiClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl DocumentAiClient {
    /// 创建新的文档 AI 客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Other(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl DocumentExtractor for DocumentAiClient {
    async fn extract(
        &self,
        file_name: &str,
        pdf: &[u8],
        schema: &Value,
    ) -> Result<Value, ExtractError> {
        debug!("上传 {} ({} 字节) 到 {}", file_name, pdf.len(), self.api_url);

        let part = Part::bytes(pdf.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;

        let form = Form::new()
            .part("pdf", part)
            .text("fields_schema", schema.to_string());

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Basic {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!("{} 响应状态: {}, 长度: {}", file_name, status, body.len());

        parse_response(status, &body).map_err(|e| {
            warn!("{} 抽取失败: {}", file_name, e);
            e
        })
    }
}

/// 解析接口响应
///
/// 成功时返回 `data.extracted_schema`
pub fn parse_response(status: u16, body: &str) -> Result<Value, ExtractError> {
    if !(200..300).contains(&status) {
        return Err(ExtractError::Api {
            status,
            message: api_message(body),
        });
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| ExtractError::Malformed(e.to_string()))?;

    value
        .get("data")
        .and_then(|data| data.get("extracted_schema"))
        .cloned()
        .ok_or_else(|| ExtractError::Malformed("响应缺少 data.extracted_schema".to_string()))
}

/// 从错误响应中取出接口给出的说明
fn api_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        ["message", "error", "detail"]
            .iter()
            .find_map(|key| v.get(*key))
            .map(|m| match m {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    });

    from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "<空响应>".to_string()
        } else {
            crate::utils::logging::truncate_text(trimmed, 300)
        }
    })
}
