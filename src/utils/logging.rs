/// 日志工具模块
///
/// 提供日志初始化和运行信息输出的辅助函数
use crate::config::Config;
use crate::orchestrator::BuildReport;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info 级别
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 开始构建 - {}", config.site_title);
    info!("📁 输入文件: {}", config.input_path);
    if config.enrichment_enabled {
        info!(
            "🔗 链接解析: 开启 (并发 {}, 超时 {}ms)",
            config.max_concurrent_lookups, config.lookup_timeout_ms
        );
    } else {
        info!("🔗 链接解析: 关闭");
    }
    info!("{}", "=".repeat(60));
}

/// 记录记录加载信息
pub fn log_studies_loaded(total: usize, accepted: usize) {
    info!("✓ 读取到 {} 条记录，其中 {} 条合法", total, accepted);
}

/// 打印最终统计信息
pub fn print_final_stats(report: &BuildReport, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 构建完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 合法记录: {}/{}", report.accepted, report.loaded);
    info!("❌ 跳过记录: {}", report.rejected);
    info!("📂 未分类记录: {}", report.ungrouped);
    info!("🔗 已解析链接: {}", report.enriched);
    info!(
        "📰 订阅源条目: {} (跳过 {})",
        report.feed_items, report.feed_omissions
    );
    info!("{}", "=".repeat(60));
    info!("\n页面已写入: {}", config.page_output_path);
    info!("订阅源已写入: {}", config.feed_output_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
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
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("研究摘要记录", 4), "研究摘要...");
    }
}
