use std::fmt::Display;

use chromiumoxide::{Browser, Page};
use futures::{Stream, StreamExt};
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};

/// 连接到已运行的浏览器（需要以 `--remote-debugging-port` 启动）
pub async fn connect_to_browser(port: u16) -> AppResult<Browser> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::browser_connection_failed(port, e)
    })?;
    debug!("浏览器连接成功");

    spawn_handler(async move {
        drain_handler(handler).await;
    });

    // 等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    Ok(browser)
}

/// 在后台驱动 CDP 事件循环
pub(crate) fn spawn_handler(handler: impl std::future::Future<Output = ()> + Send + 'static) {
    tokio::spawn(async move {
        handler.await;
        debug!("浏览器事件循环已结束");
    });
}

/// 消费 CDP 事件流直到结束，返回处理的消息数
///
/// 单条消息出错只记录，不结束循环
pub(crate) async fn drain_handler<S, E>(handler: S) -> usize
where
    S: Stream<Item = Result<(), E>>,
    E: Display,
{
    let mut handler = std::pin::pin!(handler);
    let mut processed = 0;
    while let Some(event) = handler.next().await {
        processed += 1;
        if let Err(e) = event {
            debug!("浏览器事件处理出错: {}", e);
        }
    }
    processed
}

/// 准备要自动投递的页面
///
/// - `target_urls` 非空：为每个地址新建标签页并导航
/// - `target_urls` 为空：接管浏览器里已经打开的所有标签页
pub async fn open_target_pages(browser: &Browser, target_urls: &[String]) -> AppResult<Vec<Page>> {
    if target_urls.is_empty() {
        let pages = browser
            .pages()
            .await
            .map_err(AppError::page_creation_failed)?;
        info!("接管已打开的 {} 个标签页", pages.len());
        return Ok(pages);
    }

    let mut pages = Vec::with_capacity(target_urls.len());
    for url in target_urls {
        match open_page(browser, url).await {
            Ok(page) => pages.push(page),
            // 单个页面打不开不影响其他页面
            Err(e) => warn!("⚠️ 跳过 {}: {}", url, e),
        }
    }
    Ok(pages)
}

/// 新建标签页并导航到指定地址
pub async fn open_page(browser: &Browser, url: &str) -> AppResult<Page> {
    debug!("创建新页面并导航到: {}", url);
    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        AppError::page_creation_failed(e)
    })?;

    page.goto(url).await.map_err(|e| {
        error!("导航到 {} 失败: {}", url, e);
        AppError::navigation_failed(url, e)
    })?;
    info!("已导航到: {}", url);

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handler_errors_do_not_stop_the_event_loop() {
        let events = futures::stream::iter(vec![
            Ok(()),
            Err("unexpected message"),
            Ok(()),
            Err("deserialize failed"),
            Ok(()),
        ]);

        assert_eq!(drain_handler(events).await, 5);
    }
}
