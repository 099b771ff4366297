//! 浏览器连接
//!
//! 连接已运行的浏览器或启动无头浏览器，并准备目标页面

pub mod connection;
pub mod headless;

use chromiumoxide::Browser;

use crate::config::Config;
use crate::error::AppResult;

pub use connection::{connect_to_browser, open_page, open_target_pages};
pub use headless::launch_headless_browser;

/// 按配置获取浏览器
pub async fn open_browser(config: &Config) -> AppResult<Browser> {
    if config.headless {
        launch_headless_browser(config.chrome_executable.as_deref()).await
    } else {
        connect_to_browser(config.browser_debug_port).await
    }
}
