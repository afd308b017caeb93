//! 批量页面处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责多页 PDF 的拆分、并发调度和结果汇总。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：创建文档 AI 客户端、单页处理服务、结果写入服务
//! 2. **拆分**：把源 PDF 拆成单页（失败则整次运行中止，不派发任何页面）
//! 3. **并发控制**：使用 Semaphore 限制同时在途的页面数量，按页码顺序派发
//! 4. **容错**：单页失败只记录在该页结果里，不影响其他页面
//! 5. **落盘**：每页完成即写入，全部完成后写汇总
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单页的细节
//! - **单一写者**：结果集合只由收集循环写入，工作任务之间没有共享可变状态
//! - **向下委托**：委托 PageProcessor 处理单页，ResultWriter 落盘

use crate::clients::{DocumentAiClient, DocumentExtractor};
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::PdfSplitter;
use crate::models::{BatchRun, ErrorKind, PageResult, SourceDocument};
use crate::orchestrator::single_processor;
use crate::services::{PageProcessor, ResultWriter};
use crate::utils::logging::{log_pages_loaded, log_startup, print_final_stats};
use chrono::Local;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

/// 应用主结构
pub struct App {
    config: Config,
    processor: PageProcessor,
    writer: ResultWriter,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> AppResult<Self> {
        let client = DocumentAiClient::new(&config)?;
        Self::with_extractor(config, Arc::new(client))
    }

    /// 使用指定的文档抽取实现初始化
    pub fn with_extractor(config: Config, extractor: Arc<dyn DocumentExtractor>) -> AppResult<Self> {
        log_startup(&config);

        let schema = config.load_schema()?;
        let processor = PageProcessor::new(extractor, schema, &config);
        let writer = ResultWriter::new(&config);

        Ok(Self {
            config,
            processor,
            writer,
        })
    }

    /// 批量模式：拆分配置中的 PDF 并逐页处理
    pub async fn run(&self) -> AppResult<BatchRun> {
        let path = self.config.source_pdf_path()?;
        info!("📄 源文件: {}", path.display());

        let document = SourceDocument::open(&path)?;
        let batch = run_batch(
            &document,
            self.config.max_workers,
            &self.processor,
            &self.writer,
        )
        .await?;

        print_final_stats(&batch);
        Ok(batch)
    }

    /// 单文档模式：不拆分，整份文档作为一页提交
    pub async fn run_single(&self) -> AppResult<PageResult> {
        let path = self.config.source_pdf_path()?;
        let document = SourceDocument::open(&path)?;

        let result = single_processor::process_single(&document, &self.processor).await?;
        single_processor::log_page_result(&result);
        Ok(result)
    }
}

/// 批量处理一个多页文档
///
/// # 参数
/// - `document`: 源文档
/// - `concurrency_limit`: 同时在途的页面数量上限（小于 1 时按 1 处理）
/// - `processor`: 单页处理服务
/// - `writer`: 结果写入服务
///
/// # 返回
/// 包含每一页结果的 `BatchRun`。只有拆分失败或无法创建输出目录时返回错误。
pub async fn run_batch(
    document: &SourceDocument,
    concurrency_limit: usize,
    processor: &PageProcessor,
    writer: &ResultWriter,
) -> AppResult<BatchRun> {
    let concurrency_limit = concurrency_limit.max(1);

    let artifacts = PdfSplitter::split(document)?;
    log_pages_loaded(artifacts.len(), concurrency_limit);

    let started_at = Local::now();
    let run_dir = writer.create_run(started_at)?;
    let mut batch = BatchRun::new(document.file_name(), started_at, run_dir.clone());

    let semaphore = Arc::new(Semaphore::new(concurrency_limit));
    let mut queue = artifacts.into_iter();
    let mut running = FuturesUnordered::new();

    loop {
        // 有空闲名额就按页码顺序派发
        while let Ok(permit) = semaphore.clone().try_acquire_owned() {
            let Some(artifact) = queue.next() else {
                break;
            };

            let page_index = artifact.page_index;
            let processor = processor.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                processor.process(artifact).await
            });
            running.push(async move { (page_index, handle.await) });
        }

        // 等待任意一页完成
        let Some((page_index, joined)) = running.next().await else {
            break;
        };

        let result = match joined {
            Ok(result) => result,
            Err(e) => {
                error!("[第 {} 页] 任务执行失败: {}", page_index, e);
                PageResult::failure(
                    page_index,
                    ErrorKind::WorkerFailed,
                    format!("工作任务异常退出: {}", e),
                    Local::now(),
                )
            }
        };

        if let Err(e) = writer.write_page(&run_dir, page_index, &result) {
            error!("[第 {} 页] ❌ 结果写入失败: {}", page_index, e);
            batch.record_write_error(page_index, e.to_string());
        }

        batch.record(result);
    }

    writer.finalize(&run_dir, &batch)?;
    Ok(batch)
}
