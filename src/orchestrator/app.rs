//! 应用主结构 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：加载站点注册表、创建后端客户端、连接浏览器
//! 2. **页面准备**：打开目标页面，或接管已经打开的标签页
//! 3. **并发控制**：每个页面一个任务，名额控制交给 `PageRunner`
//! 4. **资源管理**：唯一持有 Browser 的模块
//! 5. **全局统计**：汇总所有页面的最终状态
//!
//! 不处理单个页面的细节，委托 `AutomationController`

use std::sync::Arc;

use anyhow::{Context, Result};
use chromiumoxide::{Browser, Page};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::browser;
use crate::clients::{
    ApiClient, CredentialStore, FileCredentialStore, MaterialsService, OutcomeReporter,
    StaticCredential,
};
use crate::config::Config;
use crate::infrastructure::CdpPage;
use crate::models::load_sites_file;
use crate::orchestrator::page_runner::{PageRunner, RunStats};
use crate::services::{JournaledReporter, OutcomeJournal, SiteRegistry};
use crate::utils::logging::{log_pages_opened, log_startup, print_final_stats};
use crate::workflow::AutomationTimings;

/// 应用主结构
pub struct App {
    config: Config,
    browser: Browser,
    registry: Arc<SiteRegistry>,
    materials: Arc<dyn MaterialsService>,
    reporter: Arc<dyn OutcomeReporter>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let registry = Arc::new(load_registry(&config).await?);

        let journal = OutcomeJournal::with_path(config.output_log_file.clone());
        journal.init().await?;

        log_startup(&config, registry.len());

        let credentials: Arc<dyn CredentialStore> = match &config.auth_token {
            Some(token) => {
                info!("使用 AUTH_TOKEN 环境变量中的 token");
                Arc::new(StaticCredential::new(token.clone()))
            }
            None => Arc::new(FileCredentialStore::new(config.auth_token_file.clone())),
        };
        let client = Arc::new(ApiClient::new(&config, credentials)?);
        let reporter = Arc::new(JournaledReporter::new(client.clone(), journal));

        let browser = browser::open_browser(&config).await?;

        Ok(Self {
            config,
            browser,
            registry,
            materials: client,
            reporter,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let pages = browser::open_target_pages(&self.browser, &self.config.target_urls).await?;

        if pages.is_empty() {
            warn!("⚠️ 没有可处理的页面，程序结束");
            return Ok(());
        }

        log_pages_opened(pages.len(), self.config.max_concurrent_pages);

        let stats = self.process_all_pages(pages).await?;

        print_final_stats(&stats, &self.config.output_log_file);

        Ok(())
    }

    /// 为每个页面启动一个驱动器，全部页面关闭后汇总统计
    async fn process_all_pages(&self, pages: Vec<Page>) -> Result<RunStats> {
        let runner = Arc::new(PageRunner::new(
            self.registry.clone(),
            self.materials.clone(),
            self.reporter.clone(),
            AutomationTimings::from_config(&self.config),
            Arc::new(Semaphore::new(self.config.max_concurrent_pages.max(1))),
        ));
        let mut handles = Vec::with_capacity(pages.len());

        for (idx, page) in pages.into_iter().enumerate() {
            let page_index = idx + 1;
            let runner = runner.clone();

            // 名额在任务内部获取，后面的标签页不会被前面等待点击的页面卡住
            let handle = tokio::spawn(async move {
                let page = {
                    let limiter = runner.limiter();
                    let _permit = limiter.acquire().await?;
                    CdpPage::attach(page)
                        .await
                        .with_context(|| format!("[页面 #{}] 无法接管页面", page_index))?
                };
                runner.drive(Arc::new(page), page_index).await
            });
            handles.push((page_index, handle));
        }

        let mut stats = RunStats::default();
        for (page_index, handle) in handles {
            match handle.await {
                Ok(Ok(page_stats)) => stats.merge(&page_stats),
                Ok(Err(e)) => {
                    error!("[页面 #{}] ❌ 处理过程中发生错误: {:#}", page_index, e);
                    stats.pages += 1;
                    stats.errored += 1;
                }
                Err(e) => {
                    error!("[页面 #{}] 任务执行失败: {}", page_index, e);
                    stats.pages += 1;
                    stats.errored += 1;
                }
            }
        }

        if stats.errored > 0 {
            warn!("⚠️ {} 次页面处理出错", stats.errored);
        }
        Ok(stats)
    }
}

/// 加载站点注册表：配置了 `SITES_FILE` 时从文件加载，否则使用内置表
async fn load_registry(config: &Config) -> Result<SiteRegistry> {
    match &config.sites_file {
        Some(path) => {
            info!("📁 从 {} 加载站点注册表", path);
            let sites = load_sites_file(std::path::Path::new(path)).await?;
            Ok(SiteRegistry::from_sites(sites)?)
        }
        None => Ok(SiteRegistry::builtin()),
    }
}
