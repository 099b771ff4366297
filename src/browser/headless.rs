use chromiumoxide::{Browser, BrowserConfig};
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info};

use crate::browser::connection::{drain_handler, spawn_handler};
use crate::error::{AppError, AppResult, BrowserError};

/// 启动无头浏览器
///
/// `chrome_executable` 为空时由 chromiumoxide 自动查找本机的 Chrome / Chromium
pub async fn launch_headless_browser(chrome_executable: Option<&str>) -> AppResult<Browser> {
    info!("🚀 启动无头浏览器...");

    let mut builder = BrowserConfig::builder().new_headless_mode().args(vec![
        "--disable-gpu",
        "--no-sandbox",
        "--disable-dev-shm-usage",
    ]);
    if let Some(path) = chrome_executable {
        debug!("浏览器可执行文件: {}", path);
        builder = builder.chrome_executable(path);
    }

    let config = builder.build().map_err(|message| {
        error!("配置无头浏览器失败: {}", message);
        AppError::Browser(BrowserError::ConfigurationFailed { message })
    })?;

    let (browser, handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        AppError::Browser(BrowserError::ConfigurationFailed {
            message: format!("failed to launch browser: {}", e),
        })
    })?;
    debug!("无头浏览器启动成功");

    spawn_handler(async move {
        drain_handler(handler).await;
    });

    sleep(Duration::from_millis(300)).await;

    Ok(browser)
}
