//! 自动投递状态

use std::fmt;

/// 单个页面上的自动投递状态
///
/// ```text
/// Idle ─┬─> Inactive
///       └─> WaitingForTrigger ─┬─> TriggerTimedOut
///                              └─> TriggerArmed ─> Scraping ─> RequestingMaterials
///                                    ─> FillingCoverLetter ─> UploadingResume
///                                    ─> Submitting ─> Logged
/// ```
///
/// 任何阶段的致命错误都直接进入 `Logged { success: false }`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomationState {
    Idle,
    /// 当前站点不在注册表中
    Inactive,
    WaitingForTrigger,
    /// 申请按钮始终没有出现
    TriggerTimedOut,
    TriggerArmed,
    Scraping,
    RequestingMaterials,
    FillingCoverLetter,
    UploadingResume,
    Submitting,
    Logged { success: bool },
}

impl fmt::Display for AutomationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AutomationState::Idle => "idle",
            AutomationState::Inactive => "inactive",
            AutomationState::WaitingForTrigger => "waiting-for-trigger",
            AutomationState::TriggerTimedOut => "trigger-timed-out",
            AutomationState::TriggerArmed => "trigger-armed",
            AutomationState::Scraping => "scraping",
            AutomationState::RequestingMaterials => "requesting-materials",
            AutomationState::FillingCoverLetter => "filling-cover-letter",
            AutomationState::UploadingResume => "uploading-resume",
            AutomationState::Submitting => "submitting",
            AutomationState::Logged { success: true } => "logged(success)",
            AutomationState::Logged { success: false } => "logged(failure)",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_are_stable() {
        assert_eq!(AutomationState::TriggerArmed.to_string(), "trigger-armed");
        assert_eq!(
            AutomationState::Logged { success: false }.to_string(),
            "logged(failure)"
        );
    }
}
