//! 单页处理服务 - 业务能力层
//!
//! 只负责"处理一页"能力：调用文档 AI，把成功或失败统一成 `PageResult`。
//! 任何失败都在这里变成数据，不会向上抛出影响其他页面。

use crate::clients::{DocumentExtractor, ExtractError};
use crate::config::Config;
use crate::models::{ErrorKind, PageArtifact, PageResult};
use chrono::Local;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// 重试策略
///
/// 默认只请求一次，不做自动重试。`max_attempts > 1` 时只重试超时和网络错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最多请求次数（含第一次）
    pub max_attempts: u32,
    /// 两次请求之间的等待
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// 不重试
    pub fn none() -> Self {
        Self::default()
    }

    /// 第 `attempt` 次请求以 `kind` 失败后是否再试
    pub fn should_retry(&self, attempt: u32, kind: ErrorKind) -> bool {
        attempt < self.max_attempts && kind.is_transient()
    }
}

/// 单页处理服务
///
/// 职责：
/// - 把单页 PDF 和 schema 交给文档 AI
/// - 超时控制、可选重试
/// - 只处理单个页面
/// - 不出现 BatchRun / 输出目录
#[derive(Clone)]
pub struct PageProcessor {
    extractor: Arc<dyn DocumentExtractor>,
    schema: Arc<Value>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl PageProcessor {
    /// 按配置创建
    pub fn new(extractor: Arc<dyn DocumentExtractor>, schema: Value, config: &Config) -> Self {
        Self::with_options(
            extractor,
            schema,
            config.request_timeout(),
            config.retry_policy(),
        )
    }

    /// 使用自定义超时和重试策略创建
    pub fn with_options(
        extractor: Arc<dyn DocumentExtractor>,
        schema: Value,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            extractor,
            schema: Arc::new(schema),
            timeout,
            retry,
        }
    }

    /// 处理单页
    ///
    /// artifact 在返回前被消费，其临时文件随之删除
    pub async fn process(&self, artifact: PageArtifact) -> PageResult {
        let page_index = artifact.page_index;
        let started_at = Local::now();
        let mut attempt = 0;

        info!("[第 {} 页] 📤 开始调用文档 AI...", page_index);

        loop {
            attempt += 1;

            match self.extract_once(&artifact).await {
                Ok(payload) => {
                    let result = PageResult::success(page_index, payload, started_at)
                        .with_attempts(attempt);
                    info!(
                        "[第 {} 页] ✓ 抽取成功，找到 {} 个商品 ({} ms)",
                        page_index,
                        result.products().len(),
                        result.elapsed_ms()
                    );
                    return result;
                }
                Err(e) => {
                    let kind = e.kind();
                    if self.retry.should_retry(attempt, kind) {
                        warn!(
                            "[第 {} 页] ⚠️ 第 {}/{} 次请求失败 ({}), {} ms 后重试",
                            page_index,
                            attempt,
                            self.retry.max_attempts,
                            kind,
                            self.retry.backoff.as_millis()
                        );
                        tokio::time::sleep(self.retry.backoff).await;
                        continue;
                    }

                    error!("[第 {} 页] ❌ 抽取失败: {}", page_index, e);
                    return PageResult::failure(page_index, kind, e.to_string(), started_at)
                        .with_attempts(attempt);
                }
            }
        }
    }

    async fn extract_once(&self, artifact: &PageArtifact) -> Result<Value, ExtractError> {
        let call = self
            .extractor
            .extract(artifact.file_name(), artifact.bytes(), &self.schema);

        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ExtractError::Timeout(format!(
                "{} ms 内未返回",
                self.timeout.as_millis()
            ))),
        }
    }
}
