//! 投递结果日志服务 - 业务能力层
//!
//! 只负责"把结果写进本地日志文件"，上报后端由 `OutcomeReporter` 负责

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::clients::OutcomeReporter;
use crate::error::ApiError;
use crate::models::ApplicationOutcome;

/// 本地投递结果日志
///
/// 每个结果一行，程序启动时写入带时间戳的文件头
#[derive(Debug, Clone)]
pub struct OutcomeJournal {
    path: String,
}

impl OutcomeJournal {
    pub fn with_path(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// 覆盖写入文件头
    pub async fn init(&self) -> Result<()> {
        let header = format!(
            "{}\n投递结果日志 - {}\n{}\n\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        tokio::fs::write(&self.path, header)
            .await
            .with_context(|| format!("无法初始化日志文件 {}", self.path))
    }

    /// 追加一条结果
    pub async fn append(&self, outcome: &ApplicationOutcome) -> Result<()> {
        debug!("写入结果日志: {}", outcome);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("无法打开日志文件 {}", self.path))?;

        let line = format!(
            "{} {}\n",
            chrono::Local::now().format("%H:%M:%S"),
            outcome
        );
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }
}

/// 先写本地日志，再上报后端
///
/// 本地日志写入失败只记警告，不影响上报结果
pub struct JournaledReporter {
    remote: Arc<dyn OutcomeReporter>,
    journal: OutcomeJournal,
}

impl JournaledReporter {
    pub fn new(remote: Arc<dyn OutcomeReporter>, journal: OutcomeJournal) -> Self {
        Self { remote, journal }
    }
}

#[async_trait]
impl OutcomeReporter for JournaledReporter {
    async fn report(&self, outcome: &ApplicationOutcome) -> Result<(), ApiError> {
        if let Err(e) = self.journal.append(outcome).await {
            warn!("⚠️ 写入本地结果日志失败: {:#}", e);
        }
        self.remote.report(outcome).await
    }
}
