pub mod controller;
pub mod run_ctx;
pub mod state;

pub use controller::{AutomationController, AutomationTimings};
pub use run_ctx::RunCtx;
pub use state::AutomationState;
