//! PDF 拆分器 - 基础设施层
//!
//! 把多页 PDF 拆成独立的单页 PDF，每页落到一个临时文件

use crate::error::{AppError, AppResult};
use crate::models::{PageArtifact, SourceDocument};
use lopdf::Document;
use tracing::debug;

/// PDF 拆分器
///
/// 职责：
/// - 解析源 PDF
/// - 为每一页生成自包含的单页 PDF 字节流
/// - 不认识 PageResult / 输出目录
pub struct PdfSplitter;

impl PdfSplitter {
    /// 按页拆分
    ///
    /// # 返回
    /// 按原始页序排列的 `PageArtifact`，页码从 1 开始连续编号。
    /// 文档无法解析或没有页面时返回 `InvalidDocument`。
    pub fn split(document: &SourceDocument) -> AppResult<Vec<PageArtifact>> {
        let path = document.path.display().to_string();
        let doc = load(document)?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(AppError::empty_document(path));
        }

        let stem = document
            .path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let mut artifacts = Vec::with_capacity(page_numbers.len());
        for (position, page_number) in page_numbers.iter().enumerate() {
            let page_index = position as u32 + 1;
            let others: Vec<u32> = page_numbers
                .iter()
                .copied()
                .filter(|n| n != page_number)
                .collect();

            let mut single = doc.clone();
            single.delete_pages(&others);
            single.prune_objects();

            let mut bytes = Vec::new();
            single
                .save_to(&mut bytes)
                .map_err(|e| AppError::invalid_document(&path, format!("第 {} 页写出失败: {}", page_index, e)))?;

            debug!("第 {} 页拆分完成，{} 字节", page_index, bytes.len());

            let file_name = format!("{}_page_{:03}.pdf", stem, page_index);
            artifacts.push(PageArtifact::new(page_index, file_name, bytes)?);
        }

        Ok(artifacts)
    }

    /// 统计页数
    pub fn page_count(document: &SourceDocument) -> AppResult<usize> {
        Ok(load(document)?.get_pages().len())
    }
}

fn load(document: &SourceDocument) -> AppResult<Document> {
    Document::load_mem(document.bytes())
        .map_err(|e| AppError::invalid_document(document.path.display().to_string(), e))
}
