//! 自动投递流程 - 流程层
//!
//! 核心职责：定义"一个职位页面"的完整投递流程
//!
//! 流程顺序：
//! 1. 匹配站点 → 等待申请按钮 → 挂一次性点击监听
//! 2. 点击后：抓取职位 → 请求材料 → 填求职信 → 上传简历 → 提交
//! 3. 无论哪个分支，恰好上报一次结果

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::FutureExt;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::clients::{MaterialsService, OutcomeReporter};
use crate::config::Config;
use crate::error::RunError;
use crate::infrastructure::{HostPage, Subscription};
use crate::models::{ApplicationOutcome, JobDetails, SiteConfig};
use crate::services::{ElementWaiter, FormFiller, JobDetailExtractor, SiteRegistry};
use crate::utils::logging::truncate_text;
use crate::workflow::run_ctx::RunCtx;
use crate::workflow::state::AutomationState;

/// 提示前缀，让用户知道弹窗来自自动投递
const PROMPT_PREFIX: &str = "auto-apply";

/// 投递流程中的各个等待时长
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomationTimings {
    /// 等待申请按钮出现的上限
    pub trigger_timeout: Duration,
    /// 点击申请后等待表单出现的上限
    pub form_wait_timeout: Duration,
    /// 点击提交前的等待
    pub submit_settle_delay: Duration,
}

impl AutomationTimings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            trigger_timeout: config.trigger_timeout(),
            form_wait_timeout: config.form_wait_timeout(),
            submit_settle_delay: config.submit_settle_delay(),
        }
    }
}

impl Default for AutomationTimings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 自动投递控制器
///
/// - 每个页面一个控制器，状态只由自己持有（`&mut self`），不需要锁
/// - 申请按钮的点击监听只挂一次（`has_armed`），第一次点击后即释放
/// - 流程中任何错误（包括 panic）都在这里收口，转成一条失败结果
pub struct AutomationController {
    page: Arc<dyn HostPage>,
    registry: Arc<SiteRegistry>,
    materials: Arc<dyn MaterialsService>,
    reporter: Arc<dyn OutcomeReporter>,
    timings: AutomationTimings,
    waiter: ElementWaiter,
    extractor: JobDetailExtractor,
    filler: FormFiller,
    ctx: RunCtx,
    state: AutomationState,
    site: Option<SiteConfig>,
    has_armed: bool,
    trigger: Option<Subscription>,
    job: Option<JobDetails>,
    outcome: Option<ApplicationOutcome>,
}

impl AutomationController {
    pub fn new(
        page: Arc<dyn HostPage>,
        registry: Arc<SiteRegistry>,
        materials: Arc<dyn MaterialsService>,
        reporter: Arc<dyn OutcomeReporter>,
    ) -> Self {
        let timings = AutomationTimings::default();
        Self {
            page,
            registry,
            materials,
            reporter,
            timings,
            waiter: ElementWaiter::new(timings.trigger_timeout),
            extractor: JobDetailExtractor::new(),
            filler: FormFiller::new(),
            ctx: RunCtx::new(1),
            state: AutomationState::Idle,
            site: None,
            has_armed: false,
            trigger: None,
            job: None,
            outcome: None,
        }
    }

    pub fn with_timings(mut self, timings: AutomationTimings) -> Self {
        self.timings = timings;
        self.waiter = ElementWaiter::new(timings.trigger_timeout);
        self
    }

    pub fn with_page_index(mut self, page_index: usize) -> Self {
        self.ctx.page_index = page_index;
        self
    }

    pub fn state(&self) -> AutomationState {
        self.state
    }

    pub fn site(&self) -> Option<&SiteConfig> {
        self.site.as_ref()
    }

    /// 本次触发产生的结果（未触发时为 `None`）
    pub fn outcome(&self) -> Option<&ApplicationOutcome> {
        self.outcome.as_ref()
    }

    pub fn ctx(&self) -> &RunCtx {
        &self.ctx
    }

    /// 完整跑一遍：匹配站点 → 挂监听 → 等待点击 → 投递
    pub async fn run(&mut self) -> Result<AutomationState> {
        if self.start().await? != AutomationState::WaitingForTrigger {
            return Ok(self.state);
        }
        if self.arm().await? != AutomationState::TriggerArmed {
            return Ok(self.state);
        }

        info!("{} 👆 等待用户点击申请按钮...", self.ctx);
        if self.wait_for_trigger().await {
            self.on_trigger().await;
        } else {
            warn!("{} 页面已关闭，未收到点击", self.ctx);
        }
        Ok(self.state)
    }

    /// 匹配站点：`Idle → WaitingForTrigger | Inactive`
    pub async fn start(&mut self) -> Result<AutomationState> {
        if self.state != AutomationState::Idle {
            debug!("{} 已经启动过，当前状态 {}", self.ctx, self.state);
            return Ok(self.state);
        }

        let hostname = self.page.hostname().await.context("读取页面 hostname 失败")?;
        self.ctx.hostname = hostname.clone();

        match self.registry.resolve(&hostname) {
            Some(site) => {
                self.ctx.site_name = Some(site.name.clone());
                self.site = Some(site.clone());
                info!("{} ✓ 匹配到站点，开始等待申请按钮", self.ctx);
                self.transition(AutomationState::WaitingForTrigger);
            }
            None => {
                info!("{} 不是受支持的站点，自动投递不启用", self.ctx);
                self.transition(AutomationState::Inactive);
            }
        }
        Ok(self.state)
    }

    /// 等待申请按钮并挂点击监听：`WaitingForTrigger → TriggerArmed | TriggerTimedOut`
    ///
    /// 监听在控制器生命周期内最多挂一次
    pub async fn arm(&mut self) -> Result<AutomationState> {
        if self.has_armed || self.state != AutomationState::WaitingForTrigger {
            debug!("{} 不需要再挂监听，当前状态 {}", self.ctx, self.state);
            return Ok(self.state);
        }
        let Some(site) = self.site.clone() else {
            return Ok(self.state);
        };

        let page = self.page.clone();
        let button = self
            .waiter
            .wait_for_within(page.as_ref(), &site.apply_trigger, self.timings.trigger_timeout)
            .await
            .context("等待申请按钮失败")?;

        let Some(button) = button else {
            info!(
                "{} ⏱ {}ms 内未出现申请按钮，放弃",
                self.ctx,
                self.timings.trigger_timeout.as_millis()
            );
            self.transition(AutomationState::TriggerTimedOut);
            return Ok(self.state);
        };

        let subscription = page
            .listen_clicks(button)
            .await
            .context("挂载申请按钮监听失败")?;
        self.trigger = Some(subscription);
        self.has_armed = true;
        info!("{} ✓ 已挂载申请按钮监听", self.ctx);
        self.transition(AutomationState::TriggerArmed);
        Ok(self.state)
    }

    /// 等待申请按钮被点击，页面关闭或没有监听时返回 `false`
    pub async fn wait_for_trigger(&mut self) -> bool {
        match self.trigger.as_mut() {
            Some(trigger) => trigger.next().await.is_some(),
            None => false,
        }
    }

    /// 处理一次点击：执行投递流程并上报结果
    ///
    /// 只有 `TriggerArmed` 状态接受点击；流程进行中或结束后的点击直接忽略，返回 `None`
    pub async fn on_trigger(&mut self) -> Option<&ApplicationOutcome> {
        if self.state != AutomationState::TriggerArmed {
            warn!("{} ⚠️ 忽略点击，当前状态 {}", self.ctx, self.state);
            return None;
        }
        let site = self.site.clone()?;

        // 一次性监听：释放后排队的重复点击都会被丢弃
        self.trigger = None;
        info!("{} 🚀 开始自动投递", self.ctx);

        let result = AssertUnwindSafe(self.pipeline(&site)).catch_unwind().await;
        let job = self.job.clone().unwrap_or_else(JobDetails::unknown);

        let (outcome, prompt) = match result {
            Ok(Ok(details)) => {
                info!("{} ✅ 投递成功: {}", self.ctx, job);
                (ApplicationOutcome::success(&job, details), None)
            }
            Ok(Err(e)) => {
                error!("{} ❌ 投递失败: {}", self.ctx, e);
                let prompt = manual_prompt(&e);
                (ApplicationOutcome::failure(&job, e.to_string()), Some(prompt))
            }
            Err(panic) => {
                let e = RunError::Unexpected(anyhow::anyhow!(
                    "pipeline panicked: {}",
                    panic_message(panic.as_ref())
                ));
                error!("{} ❌ 投递流程崩溃: {}", self.ctx, e);
                let prompt = manual_prompt(&e);
                (ApplicationOutcome::failure(&job, e.to_string()), Some(prompt))
            }
        };

        if let Some(prompt) = prompt {
            if let Err(e) = self.page.alert(&prompt).await {
                warn!("{} ⚠️ 无法显示手动完成提示: {:#}", self.ctx, e);
            }
        }

        match self.reporter.report(&outcome).await {
            Ok(()) => debug!("{} 结果已上报", self.ctx),
            Err(e) => error!("{} ❌ 结果上报失败（不重试）: {}", self.ctx, e),
        }

        self.transition(AutomationState::Logged {
            success: outcome.is_success(),
        });
        self.outcome = Some(outcome);
        self.outcome.as_ref()
    }

    /// 投递流程，返回成功时的说明
    async fn pipeline(&mut self, site: &SiteConfig) -> Result<String, RunError> {
        let page = self.page.clone();
        let page = page.as_ref();

        // ========== 抓取职位信息 ==========
        self.transition(AutomationState::Scraping);
        let job = self.extractor.extract(page, site).await;
        info!("{} 📄 职位: {}", self.ctx, job);
        debug!("{} 职位描述: {}", self.ctx, truncate_text(&job.description, 80));
        self.job = Some(job.clone());

        // ========== 请求申请材料 ==========
        self.transition(AutomationState::RequestingMaterials);
        let materials = self.materials.request_materials(&job).await?;

        // ========== 填写求职信（失败不中止） ==========
        self.transition(AutomationState::FillingCoverLetter);
        let form_ready = match self
            .waiter
            .wait_for_within(page, &site.cover_letter_input, self.timings.form_wait_timeout)
            .await
        {
            Ok(found) => found.is_some(),
            Err(e) => {
                warn!("{} ⚠️ 等待申请表单失败: {:#}", self.ctx, e);
                false
            }
        };
        let cover_letter_filled = if form_ready {
            self.filler
                .fill_cover_letter(page, &site.cover_letter_input, &materials.cover_letter)
                .await
        } else {
            warn!(
                "{} ⚠️ {}ms 内未出现求职信输入框，跳过",
                self.ctx,
                self.timings.form_wait_timeout.as_millis()
            );
            false
        };

        // ========== 上传简历 ==========
        self.transition(AutomationState::UploadingResume);
        self.filler
            .attach_resume(page, &site.resume_input, &materials.resume_url)
            .await?;

        // ========== 提交 ==========
        self.transition(AutomationState::Submitting);
        sleep(self.timings.submit_settle_delay).await;

        let submit = page
            .query(&site.submit_control)
            .await
            .context("locating submit control")?
            .ok_or(RunError::SubmitControlMissing)?;
        page.click(submit)
            .await
            .context("clicking submit control")?;
        info!("{} 📤 已点击提交按钮", self.ctx);

        Ok(if cover_letter_filled {
            "Application submitted successfully.".to_string()
        } else {
            "Application submitted successfully (without cover letter).".to_string()
        })
    }

    fn transition(&mut self, next: AutomationState) {
        debug!("{} 状态 {} → {}", self.ctx, self.state, next);
        self.state = next;
    }
}

/// 失败后提示用户手动完成的文案
fn manual_prompt(error: &RunError) -> String {
    match error {
        RunError::ResumeUpload(_) => {
            format!("{}: Failed to upload resume. Please upload manually.", PROMPT_PREFIX)
        }
        RunError::SubmitControlMissing => format!(
            "{}: Submit button not found. Please complete manually.",
            PROMPT_PREFIX
        ),
        other => format!(
            "{}: Auto-apply failed. Please apply manually.\nError: {}",
            PROMPT_PREFIX, other
        ),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
