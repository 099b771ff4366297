//! 基础设施层
//!
//! 持有稀缺资源（Page），只暴露能力

pub mod binding_bridge;
pub mod cdp_page;
pub mod js_executor;
pub mod page;

pub use binding_bridge::BindingBridge;
pub use cdp_page::CdpPage;
pub use js_executor::JsExecutor;
pub use page::{DomEvent, ElementHandle, HostPage, RemoteFile, Subscription};
