//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责页面调度和资源管理，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! app::App (处理 Vec<Page>)
//!     ↓
//! page_runner::PageRunner (单个标签页，每次加载一个控制器)
//!     ↓
//! workflow::AutomationController (处理一次页面加载)
//!     ↓
//! services (能力层：registry / waiter / extractor / filler / journal)
//!     ↓
//! clients (后端：materials / outcome)   infrastructure (页面：HostPage / CdpPage)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有 Browser
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod app;
pub mod page_runner;

pub use app::App;
pub use page_runner::{PageRunner, RunStats};
