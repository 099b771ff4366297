use serde::{Deserialize, Serialize};

/// 页面元素定位器（CSS 选择器）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Locator {
    fn from(selector: &str) -> Self {
        Self::new(selector)
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 单个招聘站点的定位器集合
///
/// 由注册表统一持有，运行期间只读
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// 站点名称（仅用于日志）
    pub name: String,
    /// 用于匹配 hostname 的域名片段
    pub domain: String,
    pub apply_trigger: Locator,
    pub job_title: Locator,
    pub company_name: Locator,
    pub job_description: Locator,
    pub cover_letter_input: Locator,
    pub resume_input: Locator,
    pub submit_control: Locator,
}

impl SiteConfig {
    /// hostname 是否属于该站点（子串匹配，不区分大小写）
    pub fn matches(&self, hostname: &str) -> bool {
        hostname
            .to_ascii_lowercase()
            .contains(&self.domain.to_ascii_lowercase())
    }
}

/// 内置注册表条目，字段均为静态字符串
#[derive(Debug, Clone, Copy)]
pub struct StaticSite {
    pub name: &'static str,
    pub apply_trigger: &'static str,
    pub job_title: &'static str,
    pub company_name: &'static str,
    pub job_description: &'static str,
    pub cover_letter_input: &'static str,
    pub resume_input: &'static str,
    pub submit_control: &'static str,
}

impl StaticSite {
    pub fn to_config(&self, domain: &str) -> SiteConfig {
        SiteConfig {
            name: self.name.to_string(),
            domain: domain.to_string(),
            apply_trigger: self.apply_trigger.into(),
            job_title: self.job_title.into(),
            company_name: self.company_name.into(),
            job_description: self.job_description.into(),
            cover_letter_input: self.cover_letter_input.into(),
            resume_input: self.resume_input.into(),
            submit_control: self.submit_control.into(),
        }
    }
}
