//! 表单填写服务 - 业务能力层
//!
//! 只负责把材料写进宿主页面的表单，不关心流程
//!
//! 页面随时可能改动 DOM，每次写入前都重新定位，不复用之前的查找结果

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::error::FileInjectionError;
use crate::infrastructure::{DomEvent, HostPage};
use crate::models::Locator;

/// 无法从地址推断文件名时使用的简历文件名
pub const DEFAULT_RESUME_FILE_NAME: &str = "resume.pdf";

/// 表单填写服务
#[derive(Debug, Default, Clone, Copy)]
pub struct FormFiller;

impl FormFiller {
    pub fn new() -> Self {
        Self
    }

    /// 填写求职信
    ///
    /// 尽力而为：控件不存在、内容为空或页面出错都只记警告并返回 `false`
    pub async fn fill_cover_letter(&self, page: &dyn HostPage, locator: &Locator, text: &str) -> bool {
        if text.trim().is_empty() {
            warn!("⚠️ 后端没有返回求职信内容，跳过填写");
            return false;
        }

        let element = match page.query(locator).await {
            Ok(Some(element)) => element,
            Ok(None) => {
                warn!("⚠️ 未找到求职信输入框: {}", locator);
                return false;
            }
            Err(e) => {
                warn!("⚠️ 查找求职信输入框失败: {:#}", e);
                return false;
            }
        };

        let filled = async {
            page.set_value(element, text).await?;
            // 宿主页面的响应式逻辑依赖这两个事件
            page.dispatch(element, DomEvent::Input).await?;
            page.dispatch(element, DomEvent::Change).await?;
            anyhow::Ok(())
        }
        .await;

        match filled {
            Ok(()) => {
                info!("✓ 求职信已填写 ({} 字符)", text.chars().count());
                true
            }
            Err(e) => {
                warn!("⚠️ 填写求职信失败: {:#}", e);
                false
            }
        }
    }

    /// 上传简历
    ///
    /// 拉取 `resume_url`，在页面中生成 File 赋给上传控件，再派发 change 事件。
    /// 任何一步失败都会中止本次投递
    pub async fn attach_resume(
        &self,
        page: &dyn HostPage,
        locator: &Locator,
        resume_url: &str,
    ) -> Result<(), FileInjectionError> {
        let element = page
            .query(locator)
            .await
            .map_err(|e| FileInjectionError::Page(format!("{:#}", e)))?
            .ok_or_else(|| FileInjectionError::InputNotFound {
                locator: locator.to_string(),
            })?;

        let file_name = resume_file_name(resume_url);
        debug!("拉取简历: {} -> {}", resume_url, file_name);
        let file = page.fetch_file(resume_url, &file_name).await?;
        debug!("简历已拉取: {} ({} 字节, {})", file.name, file.size, file.mime);

        page.attach_file(element, &file).await?;
        page.dispatch(element, DomEvent::Change)
            .await
            .map_err(|e| FileInjectionError::Page(format!("{:#}", e)))?;

        info!("✓ 简历已上传: {}", file.name);
        Ok(())
    }
}

/// 从地址的最后一段路径推断文件名
fn resume_file_name(resume_url: &str) -> String {
    Url::parse(resume_url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| name.contains('.'))
        .unwrap_or_else(|| DEFAULT_RESUME_FILE_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePage;

    const COVER: &str = "textarea[name=\"coverletter\"]";
    const RESUME: &str = "input[type=\"file\"][name=\"resume\"]";
    const RESUME_URL: &str = "https://x/r.pdf";

    #[tokio::test]
    async fn cover_letter_sets_value_and_raises_events() {
        let page = FakePage::new("www.linkedin.com").with_element(COVER, "");

        let filled = FormFiller::new()
            .fill_cover_letter(&page, &Locator::from(COVER), "Dear Hiring Manager...")
            .await;

        assert!(filled);
        assert_eq!(page.value_of(COVER).as_deref(), Some("Dear Hiring Manager..."));
        assert_eq!(page.events_of(COVER), vec![DomEvent::Input, DomEvent::Change]);
    }

    #[tokio::test]
    async fn missing_cover_letter_input_is_a_soft_failure() {
        let page = FakePage::new("www.linkedin.com");

        let filled = FormFiller::new()
            .fill_cover_letter(&page, &Locator::from(COVER), "Dear Hiring Manager...")
            .await;

        assert!(!filled);
        assert_eq!(page.write_count(), 0);
    }

    #[tokio::test]
    async fn empty_cover_letter_is_not_written() {
        let page = FakePage::new("www.linkedin.com").with_element(COVER, "");

        let filled = FormFiller::new()
            .fill_cover_letter(&page, &Locator::from(COVER), "  ")
            .await;

        assert!(!filled);
        assert_eq!(page.write_count(), 0);
    }

    #[tokio::test]
    async fn resume_is_fetched_attached_and_announced() {
        let page = FakePage::new("www.linkedin.com").with_element(RESUME, "");
        page.serve(RESUME_URL, "application/pdf", 2048);

        FormFiller::new()
            .attach_resume(&page, &Locator::from(RESUME), RESUME_URL)
            .await
            .unwrap();

        let files = page.files_of(RESUME);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "r.pdf");
        assert_eq!(files[0].mime, "application/pdf");
        assert_eq!(page.events_of(RESUME), vec![DomEvent::Change]);
    }

    #[tokio::test]
    async fn missing_resume_input_is_reported() {
        let page = FakePage::new("www.linkedin.com");
        page.serve(RESUME_URL, "application/pdf", 2048);

        let err = FormFiller::new()
            .attach_resume(&page, &Locator::from(RESUME), RESUME_URL)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            FileInjectionError::InputNotFound {
                locator: RESUME.to_string()
            }
        );
    }

    #[tokio::test]
    async fn platform_restriction_is_its_own_failure() {
        let page = FakePage::new("www.linkedin.com").with_element(RESUME, "");
        page.serve(RESUME_URL, "application/pdf", 2048);
        page.restrict_file_inputs();

        let err = FormFiller::new()
            .attach_resume(&page, &Locator::from(RESUME), RESUME_URL)
            .await
            .unwrap_err();

        assert!(matches!(err, FileInjectionError::PlatformRestricted(_)));
        assert!(page.events_of(RESUME).is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_stops_before_touching_the_input() {
        let page = FakePage::new("www.linkedin.com").with_element(RESUME, "");
        page.fail_fetch(RESUME_URL, "403 Forbidden");

        let err = FormFiller::new()
            .attach_resume(&page, &Locator::from(RESUME), RESUME_URL)
            .await
            .unwrap_err();

        assert!(matches!(err, FileInjectionError::FetchFailed { ref message, .. } if message == "403 Forbidden"));
        assert!(page.files_of(RESUME).is_empty());
    }

    #[test]
    fn resume_file_name_follows_the_url() {
        assert_eq!(resume_file_name("https://cdn.example.com/u/42/Jane_Doe.pdf"), "Jane_Doe.pdf");
        assert_eq!(resume_file_name("https://cdn.example.com/resumes/42"), DEFAULT_RESUME_FILE_NAME);
        assert_eq!(resume_file_name("https://cdn.example.com/"), DEFAULT_RESUME_FILE_NAME);
        assert_eq!(resume_file_name("not a url"), DEFAULT_RESUME_FILE_NAME);
    }
}
