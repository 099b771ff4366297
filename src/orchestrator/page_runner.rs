//! 单页面驱动器 - 编排层
//!
//! ## 职责
//!
//! 1. **按加载建控制器**：每次页面加载都新建一个 `AutomationController`，旧的直接丢弃
//! 2. **并发控制**：Semaphore 只覆盖"匹配站点 + 挂监听"和"投递流程"两段，
//!    等待用户点击期间不占名额
//! 3. **统计**：记录每个控制器的最终状态，页面关闭后返回
//!
//! 不处理页面内的业务细节，委托 `AutomationController`

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::clients::{MaterialsService, OutcomeReporter};
use crate::infrastructure::HostPage;
use crate::services::SiteRegistry;
use crate::workflow::{AutomationController, AutomationState, AutomationTimings};

/// 控制器等待期间被什么唤醒
enum Wake {
    /// 挂监听阶段结束，`true` 表示收到了点击
    Trigger(Result<bool>),
    /// 页面重新加载
    Reload,
    /// 页面已关闭
    Closed,
}

/// 单页面驱动器，所有页面共享一个
pub struct PageRunner {
    registry: Arc<SiteRegistry>,
    materials: Arc<dyn MaterialsService>,
    reporter: Arc<dyn OutcomeReporter>,
    timings: AutomationTimings,
    limiter: Arc<Semaphore>,
}

impl PageRunner {
    pub fn new(
        registry: Arc<SiteRegistry>,
        materials: Arc<dyn MaterialsService>,
        reporter: Arc<dyn OutcomeReporter>,
        timings: AutomationTimings,
        limiter: Arc<Semaphore>,
    ) -> Self {
        Self {
            registry,
            materials,
            reporter,
            timings,
            limiter,
        }
    }

    pub fn limiter(&self) -> Arc<Semaphore> {
        self.limiter.clone()
    }

    /// 驱动一个页面直到它关闭
    pub async fn drive(&self, page: Arc<dyn HostPage>, page_index: usize) -> Result<RunStats> {
        // 先订阅加载事件，当前文档由第一个控制器处理
        let mut loads = page
            .page_loads()
            .await
            .with_context(|| format!("[页面 #{}] 无法订阅页面加载", page_index))?;

        let mut stats = RunStats {
            pages: 1,
            ..Default::default()
        };

        loop {
            stats.loads += 1;
            let mut controller = AutomationController::new(
                page.clone(),
                self.registry.clone(),
                self.materials.clone(),
                self.reporter.clone(),
            )
            .with_timings(self.timings)
            .with_page_index(page_index);

            let wake = tokio::select! {
                result = self.await_trigger(&mut controller) => Wake::Trigger(result),
                load = loads.next() => match load {
                    Some(()) => Wake::Reload,
                    None => Wake::Closed,
                },
            };

            match wake {
                Wake::Closed => {
                    stats.record(controller.state());
                    break;
                }
                Wake::Reload => {
                    stats.record(controller.state());
                    info!("{} 🔄 页面重新加载，重新匹配站点", controller.ctx());
                    continue;
                }
                Wake::Trigger(Err(e)) => {
                    error!("{} ❌ 准备过程中发生错误: {:#}", controller.ctx(), e);
                    stats.errored += 1;
                }
                Wake::Trigger(Ok(true)) => {
                    // 投递流程一旦开始就不被页面加载打断，提交本身可能触发导航
                    let _permit = self.limiter.acquire().await?;
                    controller.on_trigger().await;
                    stats.record(controller.state());
                }
                Wake::Trigger(Ok(false)) => stats.record(controller.state()),
            }

            // 当前文档已处理完，等下一次加载
            match loads.next().await {
                Some(()) => info!("{} 🔄 页面重新加载，重新匹配站点", controller.ctx()),
                None => break,
            }
        }

        debug!("[页面 #{}] 页面已关闭，共处理 {} 次加载", page_index, stats.loads);
        Ok(stats)
    }

    /// 匹配站点并挂监听（占用名额），然后等待点击（不占名额）
    async fn await_trigger(&self, controller: &mut AutomationController) -> Result<bool> {
        {
            let _permit = self.limiter.acquire().await?;
            if controller.start().await? != AutomationState::WaitingForTrigger {
                return Ok(false);
            }
            if controller.arm().await? != AutomationState::TriggerArmed {
                return Ok(false);
            }
        }

        info!("{} 👆 等待用户点击申请按钮...", controller.ctx());
        Ok(controller.wait_for_trigger().await)
    }
}

/// 运行统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub pages: usize,
    pub loads: usize,
    pub armed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub inactive: usize,
    pub errored: usize,
}

impl RunStats {
    pub fn record(&mut self, state: AutomationState) {
        match state {
            AutomationState::Inactive => self.inactive += 1,
            AutomationState::Logged { success } => {
                self.armed += 1;
                if success {
                    self.succeeded += 1;
                } else {
                    self.failed += 1;
                }
            }
            // 页面关闭或重新加载时仍停留在 TriggerArmed
            AutomationState::TriggerArmed => self.armed += 1,
            _ => {}
        }
    }

    pub fn merge(&mut self, other: &RunStats) {
        self.pages += other.pages;
        self.loads += other.loads;
        self.armed += other.armed;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.inactive += other.inactive;
        self.errored += other.errored;
    }
}
