use serde::{Deserialize, Serialize};

/// 定位器没有命中或内容为空时使用的占位值
pub const UNKNOWN_FIELD: &str = "unknown";

/// 从职位页面抓取到的信息
///
/// 序列化后即 `/apply/generate` 的请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetails {
    pub title: String,
    pub company: String,
    pub description: String,
}

impl JobDetails {
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            description: description.into(),
        }
    }

    /// 所有字段都是占位值
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_FIELD, UNKNOWN_FIELD, UNKNOWN_FIELD)
    }

    /// 抓取缺失的字段数量
    pub fn gap_count(&self) -> usize {
        [&self.title, &self.company, &self.description]
            .iter()
            .filter(|v| v.as_str() == UNKNOWN_FIELD)
            .count()
    }
}

impl std::fmt::Display for JobDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.title, self.company)
    }
}
