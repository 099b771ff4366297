//! 站点注册表 - 业务能力层
//!
//! 只负责"当前页面属于哪个站点"，不关心流程

use phf::phf_ordered_map;
use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::models::{SiteConfig, StaticSite};

/// 内置站点，按注册顺序匹配
///
/// 选择器会随站点改版失效，可以通过 `SITES_FILE` 覆盖整张表
static BUILTIN_SITES: phf::OrderedMap<&'static str, StaticSite> = phf_ordered_map! {
    "linkedin.com" => StaticSite {
        name: "LinkedIn",
        apply_trigger: "button.jobs-apply-button",
        job_title: "h1.job-title",
        company_name: "span.job-card-container__primary-description",
        job_description: "div.jobs-description-content__text",
        cover_letter_input: "textarea[name=\"coverletter\"]",
        resume_input: "input[type=\"file\"][name=\"resume\"]",
        submit_control: "button[type=\"submit\"]",
    },
    "indeed.com" => StaticSite {
        name: "Indeed",
        apply_trigger: "#applyButtonLink",
        job_title: "h1.jobsearch-JobInfoHeader-title",
        company_name: "div.jobsearch-CompanyInfoWithoutHeaderImage > div > div > div > div > div:nth-child(1)",
        job_description: "#jobDescriptionText",
        cover_letter_input: "textarea#coverletter-textarea",
        resume_input: "input[type=\"file\"]#resume-upload-input",
        submit_control: "button#indeed-apply-button",
    },
    "ziprecruiter.com" => StaticSite {
        name: "ZipRecruiter",
        apply_trigger: "button[data-qa=\"apply-button\"]",
        job_title: "h1.topcard__title",
        company_name: "a.topcard__org-name-link",
        job_description: "div.job_description",
        cover_letter_input: "textarea[name=\"cover_letter\"]",
        resume_input: "input[type=\"file\"][name=\"resume\"]",
        submit_control: "button[type=\"submit\"]",
    },
    "glassdoor.com" => StaticSite {
        name: "Glassdoor",
        apply_trigger: "button[data-test=\"applyButton\"]",
        job_title: "div[data-test=\"job-title\"]",
        company_name: "div[data-test=\"employer-name\"]",
        job_description: "div.jobDescriptionContent",
        cover_letter_input: "textarea[name=\"coverLetter\"]",
        resume_input: "input[type=\"file\"][name=\"resume\"]",
        submit_control: "button[type=\"submit\"]",
    },
};

/// 站点注册表
///
/// 职责：
/// - 按 hostname 子串匹配站点，先注册的优先
/// - 构造时拒绝会让同一个 hostname 命中多个条目的配置
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    sites: Vec<SiteConfig>,
}

impl SiteRegistry {
    /// 内置注册表
    pub fn builtin() -> Self {
        let sites = BUILTIN_SITES
            .entries()
            .map(|(domain, site)| site.to_config(domain))
            .collect();
        Self { sites }
    }

    /// 从外部条目构造并校验
    pub fn from_sites(sites: Vec<SiteConfig>) -> Result<Self, RegistryError> {
        if sites.is_empty() {
            return Err(RegistryError::Empty);
        }

        for (i, site) in sites.iter().enumerate() {
            let domain = site.domain.trim().to_ascii_lowercase();
            if domain.is_empty() {
                return Err(RegistryError::EmptyDomain {
                    site: site.name.clone(),
                });
            }

            for other in &sites[i + 1..] {
                let other_domain = other.domain.trim().to_ascii_lowercase();
                if domain == other_domain {
                    return Err(RegistryError::DuplicateDomain { domain });
                }
                let overlap = if other_domain.contains(&domain) {
                    Some((site, other))
                } else if domain.contains(&other_domain) {
                    Some((other, site))
                } else {
                    None
                };
                if let Some((inner, outer)) = overlap {
                    return Err(RegistryError::OverlappingDomains {
                        inner: inner.domain.clone(),
                        inner_site: inner.name.clone(),
                        outer: outer.domain.clone(),
                        outer_site: outer.name.clone(),
                    });
                }
            }
        }

        Ok(Self { sites })
    }

    /// 按 hostname 查找站点，未命中表示自动化在该页面不启用
    pub fn resolve(&self, hostname: &str) -> Option<&SiteConfig> {
        let mut matches = self.sites.iter().filter(|site| site.matches(hostname));
        let first = matches.next()?;

        let extra: Vec<&str> = matches.map(|site| site.name.as_str()).collect();
        if !extra.is_empty() {
            warn!(
                "⚠️ {} 同时命中多个站点，使用 {}，忽略 {:?}",
                hostname, first.name, extra
            );
        }

        debug!("{} 匹配站点 {}", hostname, first.name);
        Some(first)
    }

    pub fn sites(&self) -> &[SiteConfig] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str, domain: &str) -> SiteConfig {
        BUILTIN_SITES
            .get("linkedin.com")
            .map(|s| SiteConfig {
                name: name.to_string(),
                ..s.to_config(domain)
            })
            .unwrap()
    }

    #[test]
    fn builtin_registry_keeps_registration_order() {
        let registry = SiteRegistry::builtin();
        let domains: Vec<&str> = registry.sites().iter().map(|s| s.domain.as_str()).collect();
        assert_eq!(
            domains,
            vec!["linkedin.com", "indeed.com", "ziprecruiter.com", "glassdoor.com"]
        );
        // 内置表本身必须能通过校验
        assert!(SiteRegistry::from_sites(registry.sites().to_vec()).is_ok());
    }

    #[test]
    fn resolves_by_substring_of_hostname() {
        let registry = SiteRegistry::builtin();
        assert_eq!(registry.resolve("www.linkedin.com").unwrap().name, "LinkedIn");
        assert_eq!(registry.resolve("uk.indeed.com").unwrap().name, "Indeed");
        assert_eq!(registry.resolve("WWW.GLASSDOOR.COM").unwrap().name, "Glassdoor");
    }

    #[test]
    fn unknown_hostname_is_not_an_error() {
        let registry = SiteRegistry::builtin();
        assert!(registry.resolve("example.org").is_none());
        assert!(registry.resolve("").is_none());
    }

    #[test]
    fn first_registered_site_wins() {
        // 构造时无法发现的重叠：两个片段都是同一个 hostname 的子串
        let registry = SiteRegistry {
            sites: vec![site("First", "jobs.example"), site("Second", "example.com")],
        };
        assert_eq!(registry.resolve("jobs.example.com").unwrap().name, "First");
    }

    #[test]
    fn rejects_duplicate_and_nested_domains() {
        let err = SiteRegistry::from_sites(vec![site("A", "acme.com"), site("B", "ACME.com")])
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateDomain {
                domain: "acme.com".into()
            }
        );

        let err = SiteRegistry::from_sites(vec![site("Careers", "careers.acme.com"), site("Acme", "acme.com")])
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::OverlappingDomains { ref inner, ref outer, .. }
                if inner == "acme.com" && outer == "careers.acme.com"
        ));
    }

    #[test]
    fn rejects_empty_registry_and_blank_domains() {
        assert_eq!(SiteRegistry::from_sites(vec![]).unwrap_err(), RegistryError::Empty);
        assert!(matches!(
            SiteRegistry::from_sites(vec![site("Blank", "  ")]).unwrap_err(),
            RegistryError::EmptyDomain { .. }
        ));
    }
}
