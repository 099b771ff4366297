use serde::Serialize;

use crate::models::job::JobDetails;

/// 一次投递的最终结果
///
/// 每次触发只创建一次，创建后不可修改；序列化后即 `/apply/log` 的请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationOutcome {
    title: String,
    company: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApplicationOutcome {
    pub fn success(job: &JobDetails, details: impl Into<String>) -> Self {
        Self::new(job, true, details.into())
    }

    pub fn failure(job: &JobDetails, details: impl Into<String>) -> Self {
        Self::new(job, false, details.into())
    }

    fn new(job: &JobDetails, success: bool, details: String) -> Self {
        Self {
            title: job.title.clone(),
            company: job.company.clone(),
            success,
            details: Some(details).filter(|d| !d.is_empty()),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn details(&self) -> &str {
        self.details.as_deref().unwrap_or_default()
    }
}

impl std::fmt::Display for ApplicationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(
            f,
            "[{}] {} @ {} | {}",
            status,
            self.title,
            self.company,
            self.details()
        )
    }
}
