//! 单文档处理器 - 编排层
//!
//! ## 职责
//!
//! 保留给只需要"一次调用、一个结果"的调用方：
//! 整份文档作为第 1 页直接交给 PageProcessor，不拆分、不进工作池、不写输出目录。
//! 返回的 `PageResult` 与批量模式下第 1 页的结果结构一致。

use crate::error::{AppError, AppResult};
use crate::infrastructure::PdfSplitter;
use crate::models::{PageArtifact, PageResult, SourceDocument};
use crate::services::result_writer::render_page_summary;
use crate::services::PageProcessor;
use tracing::{error, info};

/// 处理单个文档
///
/// # 参数
/// - `document`: 源文档
/// - `processor`: 单页处理服务
///
/// # 返回
/// 文档 AI 的结果（失败时为 `status = Error` 的 `PageResult`）。
/// 文档无法解析、没有页面或临时文件无法创建时返回错误，此时不会调用文档 AI。
pub async fn process_single(
    document: &SourceDocument,
    processor: &PageProcessor,
) -> AppResult<PageResult> {
    // 不拆分，但仍要求是可解析且至少有一页的 PDF
    let pages = PdfSplitter::page_count(document)?;
    if pages == 0 {
        return Err(AppError::empty_document(document.path.display().to_string()));
    }

    info!(
        "📄 单文档模式: {} ({} 页, {} 字节)",
        document.file_name(),
        pages,
        document.bytes().len()
    );

    let artifact = PageArtifact::new(1, document.file_name(), document.bytes().to_vec())?;
    Ok(processor.process(artifact).await)
}

/// 把结果逐字段打印到日志
pub fn log_page_result(result: &PageResult) {
    if result.is_success() {
        info!("✅ 处理成功，找到 {} 个商品", result.products().len());
    } else {
        error!("❌ 处理失败");
    }

    for line in render_page_summary(result).lines() {
        info!("{}", line);
    }
}
