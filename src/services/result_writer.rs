//! 结果写入服务 - 业务能力层
//!
//! 只负责"落盘"能力，不关心并发和流程
//!
//! 输出结构：
//! ```text
//! output/
//! └── YYYYMMDD-HHMMSS/
//!     ├── 001/
//!     │   ├── result.json
//!     │   └── summary.txt
//!     ├── 002/
//!     │   ├── result.json
//!     │   └── summary.txt
//!     ├── processing_summary.txt
//!     └── combined_results.json
//! ```

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::schema::{field_label, PRODUCT_FIELDS};
use crate::models::{BatchRun, PageResult};
use chrono::{DateTime, Local};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const RESULT_FILE: &str = "result.json";
pub const SUMMARY_FILE: &str = "summary.txt";
pub const BATCH_SUMMARY_FILE: &str = "processing_summary.txt";
pub const COMBINED_FILE: &str = "combined_results.json";

/// 结果写入服务
///
/// 职责：
/// - 创建以时间戳命名的运行目录
/// - 每页一个子目录，写入原始结果和可读摘要
/// - 所有页面完成后写汇总
/// - 每个页面目录先写到暂存目录再整体改名，不会留下写了一半的页面
pub struct ResultWriter {
    base_dir: PathBuf,
}

impl ResultWriter {
    /// 使用配置中的输出目录创建
    pub fn new(config: &Config) -> Self {
        Self::with_base_dir(&config.output_dir)
    }

    /// 使用自定义输出目录创建
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// 创建本次运行的输出目录 `<base>/<YYYYMMDD-HHMMSS>`
    pub fn create_run(&self, started_at: DateTime<Local>) -> AppResult<PathBuf> {
        let run_dir = self.base_dir.join(run_dir_name(started_at));
        fs::create_dir_all(&run_dir)
            .map_err(|e| AppError::create_dir_failed(run_dir.display().to_string(), e))?;
        debug!("创建输出目录: {}", run_dir.display());
        Ok(run_dir)
    }

    /// 写入单页结果
    ///
    /// # 返回
    /// 页面目录路径
    pub fn write_page(
        &self,
        run_dir: &Path,
        page_index: u32,
        result: &PageResult,
    ) -> AppResult<PathBuf> {
        let name = page_dir_name(page_index);
        let page_dir = run_dir.join(&name);
        let staging = run_dir.join(format!(".{}.partial", name));

        let written = stage_page(&staging, result).and_then(|_| {
            if page_dir.exists() {
                fs::remove_dir_all(&page_dir)
                    .map_err(|e| AppError::file_write_failed(page_dir.display().to_string(), e))?;
            }
            fs::rename(&staging, &page_dir)
                .map_err(|e| AppError::file_write_failed(page_dir.display().to_string(), e))
        });

        if let Err(e) = written {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        debug!("[第 {} 页] 结果已写入 {}", page_index, page_dir.display());
        Ok(page_dir)
    }

    /// 写入批次汇总和合并结果
    pub fn finalize(&self, run_dir: &Path, batch: &BatchRun) -> AppResult<()> {
        write_file(&run_dir.join(BATCH_SUMMARY_FILE), &render_batch_summary(batch))?;

        let combined = serde_json::to_string_pretty(&batch.combined_payload())?;
        write_file(&run_dir.join(COMBINED_FILE), &combined)?;

        debug!("汇总已写入 {}", run_dir.display());
        Ok(())
    }
}

/// 运行目录名：本地时间精确到秒，字典序即时间序
pub fn run_dir_name(started_at: DateTime<Local>) -> String {
    started_at.format("%Y%m%d-%H%M%S").to_string()
}

/// 页面目录名：至少 3 位补零
pub fn page_dir_name(page_index: u32) -> String {
    format!("{:03}", page_index)
}

/// 页面 `result.json` 的内容：成功时为原始 payload，失败时为错误说明
pub fn page_result_json(result: &PageResult) -> Value {
    match (&result.payload, &result.error) {
        (Some(payload), _) => payload.clone(),
        (None, Some(error)) => json!({
            "error": error.message,
            "error_kind": error.kind.as_str(),
        }),
        (None, None) => json!({ "error": "no result" }),
    }
}

/// 单页可读摘要
pub fn render_page_summary(result: &PageResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("Page {} Processing Results\n", result.page_index));
    out.push_str(&format!("{}\n", "=".repeat(50)));
    out.push_str(&format!(
        "Processed at: {}\n",
        result.finished_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("Status: {}\n", result.status.as_str()));
    out.push_str(&format!("Attempts: {}\n", result.attempts));
    out.push_str(&format!("Duration: {} ms\n\n", result.elapsed_ms()));

    if let Some(error) = &result.error {
        out.push_str(&format!("Error kind: {}\n", error.kind));
        out.push_str(&format!("ERROR: {}\n", error.message));
        return out;
    }

    let Some(payload) = &result.payload else {
        return out;
    };

    let Some(products) = payload.get("products").and_then(Value::as_array) else {
        out.push_str("Extracted data:\n");
        out.push_str(&serde_json::to_string_pretty(payload).unwrap_or_default());
        out.push('\n');
        return out;
    };

    out.push_str(&format!("{} products found\n", products.len()));
    for (i, product) in products.iter().enumerate() {
        out.push_str(&format!("\nProduct {}:\n", i + 1));
        render_product(&mut out, product);
    }
    out
}

fn render_product(out: &mut String, product: &Value) {
    let Some(fields) = product.as_object() else {
        out.push_str(&format!("  {}\n", display_value(product)));
        return;
    };

    for (key, label) in PRODUCT_FIELDS {
        if let Some(value) = fields.get(*key) {
            out.push_str(&format!("  {}: {}\n", label, display_value(value)));
        }
    }

    for (key, value) in fields {
        if PRODUCT_FIELDS.iter().any(|(k, _)| *k == key.as_str()) {
            continue;
        }
        out.push_str(&format!("  {}: {}\n", field_label(key), display_value(value)));
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "N/A".to_string(),
        other => other.to_string(),
    }
}

/// 批次汇总，页面按页码升序
pub fn render_batch_summary(batch: &BatchRun) -> String {
    let mut out = String::new();
    out.push_str("Processing Summary\n");
    out.push_str(&format!("{}\n", "=".repeat(50)));
    out.push_str(&format!("Source: {}\n", batch.source_name));
    out.push_str(&format!(
        "Run started: {}\n",
        batch.started_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("Output directory: {}\n", batch.output_dir.display()));
    out.push_str(&format!("Total pages: {}\n", batch.total_pages()));
    out.push_str(&format!("Successful pages: {}\n", batch.success_count()));
    out.push_str(&format!("Failed pages: {}\n", batch.failure_count()));
    out.push_str(&format!("Unwritten pages: {}\n\n", batch.write_errors.len()));

    out.push_str("Page Results:\n");
    for result in batch.pages() {
        let mut line = match &result.error {
            Some(error) => format!(
                "  Page {}: ERROR - {}: {}",
                page_dir_name(result.page_index),
                error.kind,
                error.message
            ),
            None => format!(
                "  Page {}: SUCCESS - {} products",
                page_dir_name(result.page_index),
                result.products().len()
            ),
        };
        // 提取结果和磁盘上的目录不一致时在同一行标出
        if let Some(reason) = batch.write_error(result.page_index) {
            line.push_str(&format!(" [NOT WRITTEN: {}]", reason));
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn stage_page(staging: &Path, result: &PageResult) -> AppResult<()> {
    if staging.exists() {
        fs::remove_dir_all(staging)
            .map_err(|e| AppError::file_write_failed(staging.display().to_string(), e))?;
    }
    fs::create_dir_all(staging)
        .map_err(|e| AppError::create_dir_failed(staging.display().to_string(), e))?;

    let result_json = serde_json::to_string_pretty(&page_result_json(result))?;
    write_file(&staging.join(RESULT_FILE), &result_json)?;
    write_file(&staging.join(SUMMARY_FILE), &render_page_summary(result))?;
    Ok(())
}

fn write_file(path: &Path, content: &str) -> AppResult<()> {
    fs::write(path, content).map_err(|e| AppError::file_write_failed(path.display().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorKind;
    use chrono::TimeZone;

    fn sample_result() -> PageResult {
        PageResult::success(
            1,
            json!({
                "products": [{
                    "id": "test123S",
                    "name": "Test Product",
                    "size": "S",
                    "price": 29.99,
                    "flower-data": "1 stem Test Flower",
                    "foliage-data": "1 stem Test Foliage",
                    "dimensions": "Height 10\", Length 8\"",
                    "construction-material": "Test Vase"
                }]
            }),
            Local::now(),
        )
    }

    #[test]
    fn test_run_dir_name_format() {
        let ts = Local.with_ymd_and_hms(2025, 3, 7, 9, 5, 1).unwrap();
        let name = run_dir_name(ts);
        assert_eq!(name, "20250307-090501");
        assert_eq!(name.len(), 15);
        assert_eq!(name.matches('-').count(), 1);
    }

    #[test]
    fn test_runs_in_different_seconds_do_not_collide() {
        let first = Local.with_ymd_and_hms(2025, 3, 7, 9, 5, 1).unwrap();
        let second = first + chrono::Duration::seconds(1);
        assert_ne!(run_dir_name(first), run_dir_name(second));
        assert!(run_dir_name(first) < run_dir_name(second));
    }

    #[test]
    fn test_page_dir_name_padding() {
        assert_eq!(page_dir_name(1), "001");
        assert_eq!(page_dir_name(42), "042");
        assert_eq!(page_dir_name(1234), "1234");
    }

    #[test]
    fn test_create_run_makes_directory() {
        let temp = tempfile::tempdir().unwrap();
        let writer = ResultWriter::with_base_dir(temp.path().join("output"));
        let ts = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();

        let run_dir = writer.create_run(ts).unwrap();
        assert!(run_dir.is_dir());
        assert_eq!(run_dir.file_name().unwrap(), "20250102-030405");
    }

    #[test]
    fn test_write_page_success() {
        let temp = tempfile::tempdir().unwrap();
        let writer = ResultWriter::with_base_dir(temp.path());
        let result = sample_result();

        let page_dir = writer.write_page(temp.path(), 1, &result).unwrap();
        assert_eq!(page_dir, temp.path().join("001"));

        let saved: Value =
            serde_json::from_str(&fs::read_to_string(page_dir.join(RESULT_FILE)).unwrap()).unwrap();
        assert_eq!(Some(saved), result.payload);

        let summary = fs::read_to_string(page_dir.join(SUMMARY_FILE)).unwrap();
        assert!(summary.contains("Page 1 Processing Results"));
        assert!(summary.contains("Test Product"));
        assert!(summary.contains("1 products found"));
        assert!(summary.contains("Construction Material: Test Vase"));

        assert!(!temp.path().join(".001.partial").exists());
    }

    #[test]
    fn test_write_page_error() {
        let temp = tempfile::tempdir().unwrap();
        let writer = ResultWriter::with_base_dir(temp.path());
        let result =
            PageResult::failure(1, ErrorKind::ApiError, "Test error message", Local::now());

        let page_dir = writer.write_page(temp.path(), 1, &result).unwrap();

        let summary = fs::read_to_string(page_dir.join(SUMMARY_FILE)).unwrap();
        assert!(summary.contains("ERROR: Test error message"));
        assert!(summary.contains("Error kind: ApiError"));

        let saved: Value =
            serde_json::from_str(&fs::read_to_string(page_dir.join(RESULT_FILE)).unwrap()).unwrap();
        assert_eq!(saved["error"], "Test error message");
        assert_eq!(saved["error_kind"], "ApiError");
    }

    #[test]
    fn test_rewriting_page_replaces_directory() {
        let temp = tempfile::tempdir().unwrap();
        let writer = ResultWriter::with_base_dir(temp.path());

        writer
            .write_page(
                temp.path(),
                2,
                &PageResult::failure(2, ErrorKind::Timeout, "slow", Local::now()),
            )
            .unwrap();
        let page_dir = writer.write_page(temp.path(), 2, &sample_result()).unwrap();

        let summary = fs::read_to_string(page_dir.join(SUMMARY_FILE)).unwrap();
        assert!(summary.contains("Status: SUCCESS"));
    }

    #[test]
    fn test_write_page_into_missing_run_dir_fails_cleanly() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();

        let writer = ResultWriter::with_base_dir(temp.path());
        let err = writer.write_page(&blocker, 1, &sample_result()).unwrap_err();
        assert!(err.to_string().contains("not-a-dir"));
    }

    #[test]
    fn test_finalize_writes_summary_and_combined() {
        let temp = tempfile::tempdir().unwrap();
        let writer = ResultWriter::with_base_dir(temp.path());

        let mut batch = BatchRun::new("catalog.pdf", Local::now(), temp.path().to_path_buf());
        batch.record(PageResult::failure(2, ErrorKind::Timeout, "slow", Local::now()));
        batch.record(sample_result());

        writer.finalize(temp.path(), &batch).unwrap();

        let summary = fs::read_to_string(temp.path().join(BATCH_SUMMARY_FILE)).unwrap();
        assert!(summary.contains("Successful pages: 1"));
        assert!(summary.contains("Failed pages: 1"));
        let first = summary.find("Page 001: SUCCESS - 1 products").unwrap();
        let second = summary.find("Page 002: ERROR - Timeout: slow").unwrap();
        assert!(first < second);

        let combined: Value =
            serde_json::from_str(&fs::read_to_string(temp.path().join(COMBINED_FILE)).unwrap())
                .unwrap();
        assert_eq!(combined["products"].as_array().unwrap().len(), 1);
        assert_eq!(combined["total_pages"], 2);
    }

    #[test]
    fn test_batch_summary_marks_unwritten_page() {
        let mut batch = BatchRun::new("catalog.pdf", Local::now(), PathBuf::from("out"));
        batch.record(sample_result());
        batch.record(PageResult::success(2, json!({"products": []}), Local::now()));
        batch.record_write_error(2, "Not a directory");

        let summary = render_batch_summary(&batch);
        assert!(summary.contains("Unwritten pages: 1"));
        assert!(summary.contains("Page 001: SUCCESS - 1 products\n"));
        assert!(summary.contains("Page 002: SUCCESS - 0 products [NOT WRITTEN: Not a directory]"));
    }

    #[test]
    fn test_payload_without_products_is_rendered_raw() {
        let result = PageResult::success(5, json!({"items": ["a"]}), Local::now());
        let summary = render_page_summary(&result);
        assert!(summary.contains("Extracted data:"));
        assert!(summary.contains("\"items\""));
    }
}
