use std::sync::Arc;

use auto_apply::browser::{connect_to_browser, open_page};
use auto_apply::config::Config;
use auto_apply::infrastructure::{CdpPage, HostPage};
use auto_apply::models::Locator;
use auto_apply::services::ElementWaiter;
use auto_apply::utils::logging;

// 以下测试需要本机浏览器以调试端口运行，默认忽略：cargo test -- --ignored

#[tokio::test]
#[ignore]
async fn test_browser_connection() {
    // 初始化日志
    logging::init(true);

    // 加载配置
    let config = Config::from_env();

    let result = connect_to_browser(config.browser_debug_port).await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore]
async fn test_page_capabilities() {
    logging::init(true);
    let config = Config::from_env();

    let browser = connect_to_browser(config.browser_debug_port)
        .await
        .expect("连接浏览器失败");
    let page = open_page(
        &browser,
        "data:text/html,<h1 class='job-title'>Software  Engineer</h1><textarea name='coverletter'></textarea>",
    )
    .await
    .expect("打开页面失败");

    let page = CdpPage::attach(page).await.expect("接管页面失败");

    let title = page
        .query(&Locator::from("h1.job-title"))
        .await
        .expect("查询失败")
        .expect("标题应该存在");
    let text = page.inner_text(title).await.expect("读取文本失败");
    assert_eq!(text.as_deref(), Some("Software Engineer"));

    let textarea = page
        .query(&Locator::from("textarea[name=\"coverletter\"]"))
        .await
        .expect("查询失败")
        .expect("输入框应该存在");
    page.set_value(textarea, "Dear Hiring Manager...")
        .await
        .expect("赋值失败");

    assert!(page
        .query(&Locator::from("#does-not-exist"))
        .await
        .expect("查询失败")
        .is_none());
}

#[tokio::test]
#[ignore]
async fn test_waiter_sees_inserted_element() {
    logging::init(true);
    let config = Config::from_env();

    let browser = connect_to_browser(config.browser_debug_port)
        .await
        .expect("连接浏览器失败");
    let page = open_page(
        &browser,
        "data:text/html,<script>setTimeout(() => { const b = document.createElement('button'); b.id = 'apply'; document.body.appendChild(b); }, 500)</script>",
    )
    .await
    .expect("打开页面失败");

    let page: Arc<dyn HostPage> = Arc::new(CdpPage::attach(page).await.expect("接管页面失败"));

    let found = ElementWaiter::default()
        .wait_for(page.as_ref(), &Locator::from("#apply"))
        .await
        .expect("等待失败");

    assert!(found.is_some(), "按钮应该在超时前出现");
}

#[tokio::test]
#[ignore]
async fn test_page_loads_follow_navigation() {
    logging::init(true);
    let config = Config::from_env();

    let browser = connect_to_browser(config.browser_debug_port)
        .await
        .expect("连接浏览器失败");
    let page = open_page(&browser, "data:text/html,<p>first</p>")
        .await
        .expect("打开页面失败");
    let navigator = page.clone();

    let page = CdpPage::attach(page).await.expect("接管页面失败");
    let mut loads = page.page_loads().await.expect("订阅页面加载失败");

    navigator
        .goto("data:text/html,<p>second</p>")
        .await
        .expect("导航失败");

    let loaded = tokio::time::timeout(std::time::Duration::from_secs(5), loads.next())
        .await
        .expect("导航后应该收到加载事件");
    assert_eq!(loaded, Some(()));
}
