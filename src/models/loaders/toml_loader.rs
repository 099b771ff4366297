use crate::error::RegistryError;
use crate::models::site::SiteConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// 站点注册表文件结构，`[[site]]` 的顺序即匹配顺序
#[derive(Debug, Deserialize)]
struct SitesFile {
    #[serde(default)]
    site: Vec<SiteConfig>,
}

/// 从 TOML 文件加载站点注册表条目
pub async fn load_sites_file(toml_file_path: &Path) -> Result<Vec<SiteConfig>> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取站点注册表文件: {}", toml_file_path.display()))?;

    let sites = parse_sites_toml(&toml_file_path.display().to_string(), &content)?;
    tracing::info!("从 {} 加载了 {} 个站点", toml_file_path.display(), sites.len());

    Ok(sites)
}

/// 解析站点注册表 TOML 文本
pub fn parse_sites_toml(path: &str, content: &str) -> Result<Vec<SiteConfig>, RegistryError> {
    let file: SitesFile = toml::from_str(content).map_err(|e| RegistryError::TomlParseFailed {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    Ok(file.site)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITES: &str = r#"
[[site]]
name = "Lever"
domain = "jobs.lever.co"
apply_trigger = "a.postings-btn"
job_title = "div.posting-headline h2"
company_name = "div.main-header-logo img"
job_description = "div.section-wrapper.page-full-width"
cover_letter_input = "textarea[name='comments']"
resume_input = "input[type='file'][name='resume']"
submit_control = "button#btn-submit"

[[site]]
name = "Greenhouse"
domain = "boards.greenhouse.io"
apply_trigger = "a#apply_button"
job_title = "h1.app-title"
company_name = "span.company-name"
job_description = "div#content"
cover_letter_input = "textarea#cover_letter_text"
resume_input = "input[type='file']#resume"
submit_control = "input#submit_app"
"#;

    #[test]
    fn parses_sites_in_file_order() {
        let sites = parse_sites_toml("sites.toml", SITES).unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].name, "Lever");
        assert_eq!(sites[1].domain, "boards.greenhouse.io");
        assert_eq!(sites[1].submit_control.as_str(), "input#submit_app");
    }

    #[test]
    fn missing_locator_is_a_parse_error() {
        let err = parse_sites_toml(
            "broken.toml",
            "[[site]]\nname = \"Half\"\ndomain = \"half.example\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::TomlParseFailed { ref path, .. } if path == "broken.toml"));
    }
}
