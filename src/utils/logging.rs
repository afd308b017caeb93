/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use crate::config::Config;
use crate::models::BatchRun;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则默认 `info`（`verbose` 时为 `debug`）。重复调用无副作用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 多页 PDF 并发抽取模式");
    info!("📊 最大并发数: {}", config.max_workers);
    info!("📁 输出目录: {}", config.output_dir);
    info!("⏱️ 单页超时: {} 秒", config.request_timeout_secs);
    if config.max_attempts > 1 {
        info!("🔁 单页最多尝试: {} 次", config.max_attempts);
    }
    info!("{}", "=".repeat(60));
}

/// 记录拆分结果
///
/// # 参数
/// - `total`: 页面总数
/// - `max_concurrent`: 最大并发数
pub fn log_pages_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 拆分出 {} 页", total);
    info!("📋 最多同时处理 {} 页，其余按页码排队\n", max_concurrent);
}

/// 打印最终统计信息
pub fn print_final_stats(batch: &BatchRun) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", batch.success_count(), batch.total_pages());
    info!("❌ 失败: {}", batch.failure_count());
    for result in batch.pages().filter(|r| !r.is_success()) {
        if let Some(error) = &result.error {
            info!("   第 {} 页: {}", result.page_index, truncate_text(&error.message, 80));
        }
    }
    if !batch.write_errors.is_empty() {
        warn!("⚠️ 结果未写入磁盘: {} 页", batch.write_errors.len());
        for (page_index, reason) in &batch.write_errors {
            warn!("   第 {} 页: {}", page_index, truncate_text(reason, 80));
        }
    }
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", batch.output_dir.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("页面处理失败原因", 4), "页面处理...");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false);
        init(true);
    }
}
