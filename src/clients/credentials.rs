//! 认证 token 读取
//!
//! token 由登录流程写入本地文件，这里只读不写

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

/// 凭据库
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 读取当前 token，未登录时返回 `None`
    async fn token(&self) -> Option<String>;
}

/// 从 token 文件读取凭据
///
/// 每次调用都重新读取，登录状态变化后无需重启
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn token(&self) -> Option<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    debug!("token 文件为空: {}", self.path.display());
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(e) => {
                debug!("无法读取 token 文件 {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

/// 固定 token（`AUTH_TOKEN` 环境变量覆盖）
#[derive(Clone)]
pub struct StaticCredential(String);

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticCredential([REDACTED])")
    }
}

#[async_trait]
impl CredentialStore for StaticCredential {
    async fn token(&self) -> Option<String> {
        let token = self.0.trim();
        (!token.is_empty()).then(|| token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn token_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn file_token_is_trimmed() {
        let file = token_file("  abc.def.ghi\n");
        let store = FileCredentialStore::new(file.path());

        assert_eq!(store.token().await.as_deref(), Some("abc.def.ghi"));
    }

    #[tokio::test]
    async fn blank_or_missing_file_means_logged_out() {
        let file = token_file("\n \n");
        assert_eq!(FileCredentialStore::new(file.path()).token().await, None);

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(".auto_apply_token");
        assert_eq!(FileCredentialStore::new(missing).token().await, None);
    }

    #[tokio::test]
    async fn static_credential_hides_its_value() {
        let credential = StaticCredential::new("secret-token");
        assert_eq!(credential.token().await.as_deref(), Some("secret-token"));
        assert!(!format!("{:?}", credential).contains("secret"));
        assert_eq!(StaticCredential::new("  ").token().await, None);
    }
}
