use serde::Deserialize;

/// 后端生成的申请材料
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationMaterials {
    pub cover_letter: String,
    /// 可直接拉取的简历文件地址
    pub resume_url: String,
}

impl ApplicationMaterials {
    pub fn new(cover_letter: impl Into<String>, resume_url: impl Into<String>) -> Self {
        Self {
            cover_letter: cover_letter.into(),
            resume_url: resume_url.into(),
        }
    }
}

/// `/apply/generate` 的原始响应体，字段在校验前都是可选的
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedMaterials {
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
}

impl GeneratedMaterials {
    /// 校验必需字段，返回缺失字段名
    pub fn validate(self) -> Result<ApplicationMaterials, &'static str> {
        let cover_letter = self.cover_letter.ok_or("coverLetter")?;
        let resume_url = self
            .resume_url
            .filter(|url| !url.trim().is_empty())
            .ok_or("resumeUrl")?;
        Ok(ApplicationMaterials {
            cover_letter,
            resume_url,
        })
    }
}
