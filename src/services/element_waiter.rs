//! 元素等待服务 - 业务能力层
//!
//! 只负责"等某个元素出现"，不轮询：订阅页面结构变化，每个变化批次重新定位一次

use std::time::Duration;

use anyhow::Result;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::infrastructure::{ElementHandle, HostPage};
use crate::models::Locator;

/// 默认等待上限
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// 元素等待服务
///
/// 每次等待独占一个变化订阅，命中或超时即释放
#[derive(Debug, Clone, Copy)]
pub struct ElementWaiter {
    default_timeout: Duration,
}

impl ElementWaiter {
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    /// 使用默认超时等待元素
    pub async fn wait_for(
        &self,
        page: &dyn HostPage,
        locator: &Locator,
    ) -> Result<Option<ElementHandle>> {
        self.wait_for_within(page, locator, self.default_timeout)
            .await
    }

    /// 等待元素出现
    ///
    /// # 返回
    /// - `Ok(Some(_))`: 元素已出现（调用时已存在则立即返回）
    /// - `Ok(None)`: 超时或页面已关闭，属于正常结果
    /// - `Err(_)`: 页面本身出错，例如定位器非法
    pub async fn wait_for_within(
        &self,
        page: &dyn HostPage,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>> {
        if let Some(element) = page.query(locator).await? {
            return Ok(Some(element));
        }

        let deadline = Instant::now() + timeout;
        let mut mutations = page.observe_mutations().await?;

        // 订阅建立前元素可能已经插入
        if let Some(element) = page.query(locator).await? {
            return Ok(Some(element));
        }

        loop {
            match timeout_at(deadline, mutations.next()).await {
                Ok(Some(())) => {
                    // 同一批次里可能排了多个通知，合并后只定位一次
                    mutations.drain();
                    if let Some(element) = page.query(locator).await? {
                        debug!("等待命中: {}", locator);
                        return Ok(Some(element));
                    }
                }
                Ok(None) => {
                    debug!("页面变化订阅已关闭，停止等待: {}", locator);
                    return Ok(None);
                }
                Err(_) => {
                    debug!("等待超时 ({}ms): {}", timeout.as_millis(), locator);
                    return Ok(None);
                }
            }
        }
    }
}

impl Default for ElementWaiter {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT_TIMEOUT)
    }
}
