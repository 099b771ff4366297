/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::orchestrator::page_runner::RunStats;

/// 初始化 tracing
///
/// 优先使用 `RUST_LOG`；未设置时默认 `info`，详细模式下为 `debug`
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("auto_apply={},warn", default_level)));

    // 测试中可能重复初始化，忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, site_count: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 自动投递模式");
    info!("🌐 已注册站点: {} 个", site_count);
    info!("📊 最大并发页面数: {}", config.max_concurrent_pages);
    if config.headless {
        info!("🖥  浏览器: 无头模式");
    } else {
        info!("🖥  浏览器: 调试端口 {}", config.browser_debug_port);
    }
    info!("{}", "=".repeat(60));
}

/// 记录页面加载信息
pub fn log_pages_opened(total: usize, max_concurrent: usize) {
    info!("✓ 共 {} 个页面待处理", total);
    info!("📋 最多同时驱动 {} 个页面\n", max_concurrent);
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📄 页面: {}，页面加载: {}", stats.pages, stats.loads);
    info!("👆 已挂载申请监听: {}/{}", stats.armed, stats.loads);
    info!("✅ 投递成功: {}", stats.succeeded);
    info!("❌ 投递失败: {}", stats.failed);
    info!("💤 未启用: {}", stats.inactive);
    if stats.errored > 0 {
        info!("⚠️ 出错: {}", stats.errored);
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
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
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_text("软件工程师", 2), "软件...");
        assert_eq!(truncate_text("Acme", 10), "Acme");
    }
}
