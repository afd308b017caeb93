//! 批次运行结果

use crate::models::page::PageResult;
use chrono::{DateTime, Local};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 一次批量处理的汇总
///
/// 结果按页码存放在 `BTreeMap` 中，无论完成顺序如何，遍历总是升序。
#[derive(Debug, Clone)]
pub struct BatchRun {
    /// 源文档名称
    pub source_name: String,
    /// 开始时间（也是输出目录名）
    pub started_at: DateTime<Local>,
    /// 本次输出目录
    pub output_dir: PathBuf,
    /// 每页结果
    pub results: BTreeMap<u32, PageResult>,
    /// 结果目录没能写到磁盘的页面及原因
    pub write_errors: BTreeMap<u32, String>,
}

impl BatchRun {
    pub fn new(source_name: impl Into<String>, started_at: DateTime<Local>, output_dir: PathBuf) -> Self {
        Self {
            source_name: source_name.into(),
            started_at,
            output_dir,
            results: BTreeMap::new(),
            write_errors: BTreeMap::new(),
        }
    }

    /// 记录一页结果，返回该页此前是否已有结果
    pub fn record(&mut self, result: PageResult) -> bool {
        self.results.insert(result.page_index, result).is_some()
    }

    /// 记录某页结果目录写入失败
    pub fn record_write_error(&mut self, page_index: u32, message: impl Into<String>) {
        self.write_errors.insert(page_index, message.into());
    }

    pub fn write_error(&self, page_index: u32) -> Option<&str> {
        self.write_errors.get(&page_index).map(String::as_str)
    }

    pub fn total_pages(&self) -> usize {
        self.results.len()
    }

    pub fn success_count(&self) -> usize {
        self.results.values().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.total_pages() - self.success_count()
    }

    /// 按页码升序遍历
    pub fn pages(&self) -> impl Iterator<Item = &PageResult> {
        self.results.values()
    }

    pub fn page(&self, page_index: u32) -> Option<&PageResult> {
        self.results.get(&page_index)
    }

    /// 合并所有成功页面的结果
    ///
    /// `products` 按页码顺序拼接，`pages` 保留每页原始 payload。
    pub fn combined_payload(&self) -> Value {
        let mut products = Vec::new();
        let mut pages = Map::new();

        for result in self.pages() {
            let Some(payload) = &result.payload else {
                continue;
            };
            products.extend(result.products().iter().cloned());
            pages.insert(result.page_index.to_string(), payload.clone());
        }

        json!({
            "source": self.source_name,
            "total_pages": self.total_pages(),
            "successful_pages": self.success_count(),
            "failed_pages": self.failure_count(),
            "unwritten_pages": self.write_errors.keys().collect::<Vec<_>>(),
            "products": products,
            "pages": pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::page::ErrorKind;

    fn ok(page: u32, id: &str) -> PageResult {
        PageResult::success(page, json!({"products": [{"id": id}]}), Local::now())
    }

    #[test]
    fn test_results_iterate_in_page_order() {
        let mut run = BatchRun::new("catalog.pdf", Local::now(), PathBuf::from("out"));
        run.record(ok(3, "c"));
        run.record(PageResult::failure(2, ErrorKind::ApiError, "500", Local::now()));
        run.record(ok(1, "a"));

        let order: Vec<u32> = run.pages().map(|r| r.page_index).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(run.success_count(), 2);
        assert_eq!(run.failure_count(), 1);
    }

    #[test]
    fn test_combined_payload_skips_failed_pages() {
        let mut run = BatchRun::new("catalog.pdf", Local::now(), PathBuf::from("out"));
        run.record(ok(2, "second"));
        run.record(ok(1, "first"));
        run.record(PageResult::failure(3, ErrorKind::Timeout, "slow", Local::now()));

        let combined = run.combined_payload();
        let ids: Vec<&str> = combined["products"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["first", "second"]);
        assert!(combined["pages"].get("3").is_none());
        assert_eq!(combined["failed_pages"], 1);
    }

    #[test]
    fn test_write_errors_are_kept_per_page() {
        let mut run = BatchRun::new("catalog.pdf", Local::now(), PathBuf::from("out"));
        run.record(ok(1, "a"));
        run.record(ok(2, "b"));
        run.record_write_error(2, "磁盘已满");

        assert_eq!(run.write_error(2), Some("磁盘已满"));
        assert_eq!(run.write_error(1), None);
        assert_eq!(run.success_count(), 2);
        assert_eq!(run.combined_payload()["unwritten_pages"], json!([2]));
    }

    #[test]
    fn test_record_reports_duplicates() {
        let mut run = BatchRun::new("x.pdf", Local::now(), PathBuf::from("out"));
        assert!(!run.record(ok(1, "a")));
        assert!(run.record(ok(1, "a")));
        assert_eq!(run.total_pages(), 1);
    }
}
