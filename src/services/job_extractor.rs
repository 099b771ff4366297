//! 职位信息抓取服务 - 业务能力层
//!
//! 只读取页面当前状态，每个字段读一次，缺失的字段用占位值代替，从不失败

use tracing::{debug, warn};

use crate::infrastructure::HostPage;
use crate::models::{JobDetails, Locator, SiteConfig, UNKNOWN_FIELD};

/// 职位信息抓取服务
#[derive(Debug, Default, Clone, Copy)]
pub struct JobDetailExtractor;

impl JobDetailExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 按站点定位器抓取职位信息
    pub async fn extract(&self, page: &dyn HostPage, site: &SiteConfig) -> JobDetails {
        let title = self.read_field(page, &site.job_title, "title").await;
        let company = self.read_field(page, &site.company_name, "company").await;
        let description = self
            .read_field(page, &site.job_description, "description")
            .await;

        let details = JobDetails {
            title: collapse_whitespace(&title),
            company: collapse_whitespace(&company),
            description,
        };

        if details.gap_count() > 0 {
            debug!("职位信息有 {} 个字段缺失: {}", details.gap_count(), details);
        }
        details
    }

    async fn read_field(&self, page: &dyn HostPage, locator: &Locator, field: &str) -> String {
        let element = match page.query(locator).await {
            Ok(Some(element)) => element,
            Ok(None) => {
                debug!("字段 {} 未找到: {}", field, locator);
                return UNKNOWN_FIELD.to_string();
            }
            Err(e) => {
                warn!("读取字段 {} 失败: {:#}", field, e);
                return UNKNOWN_FIELD.to_string();
            }
        };

        match page.inner_text(element).await {
            Ok(Some(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => UNKNOWN_FIELD.to_string(),
            Err(e) => {
                warn!("读取字段 {} 文本失败: {:#}", field, e);
                UNKNOWN_FIELD.to_string()
            }
        }
    }
}

/// 把连续空白压成一个空格
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
