//! # Auto Apply
//!
//! 在第三方招聘网站页面上自动完成职位申请的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `HostPage` - 页面能力接口（定位、读写、点击、观察）
//! - `CdpPage` - 基于 CDP 的实现，`JsExecutor` 是唯一的 page owner
//!
//! ### ② 业务能力层（Services / Clients）
//! - `services/` - 描述"我能做什么"，只处理单个页面
//! - `SiteRegistry` - 站点匹配
//! - `ElementWaiter` - 等待元素出现
//! - `JobDetailExtractor` - 职位信息抓取
//! - `FormFiller` - 求职信 / 简历注入
//! - `clients/` - 后端 `/apply/generate` 与 `/apply/log`
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个职位页面"的完整投递流程
//! - `AutomationController` - 状态机（trigger → scrape → materials → fill → submit → log）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 连接浏览器、打开页面、汇总统计
//! - `orchestrator/page_runner` - 每个标签页每次加载一个控制器，限制并发
//!
//! ## 模块结构

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
#[cfg(any(test, feature = "test-export-mocks"))]
pub mod testing;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{CdpPage, HostPage, JsExecutor};
pub use models::{ApplicationMaterials, ApplicationOutcome, JobDetails, Locator, SiteConfig};
pub use orchestrator::{App, PageRunner};
pub use services::SiteRegistry;
pub use workflow::{AutomationController, AutomationState, AutomationTimings};
