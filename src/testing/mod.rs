//! 测试工具：假页面与后端 mock

pub mod fake_page;

pub use crate::clients::contract::{MockMaterialsService, MockOutcomeReporter};
pub use fake_page::FakePage;
