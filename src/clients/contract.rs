//! 后端服务接口
//!
//! 流程层只依赖这两个 trait，生产环境由 `ApiClient` 实现，测试中使用 mockall 生成的 mock

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::ApiError;
use crate::models::{ApplicationMaterials, ApplicationOutcome, JobDetails};

/// 申请材料生成服务（`POST /apply/generate`）
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait MaterialsService: Send + Sync {
    /// 为职位生成求职信并返回简历地址，不重试
    async fn request_materials(&self, job: &JobDetails) -> Result<ApplicationMaterials, ApiError>;
}

/// 投递结果上报服务（`POST /apply/log`）
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait OutcomeReporter: Send + Sync {
    /// 上报一次投递结果，不重试
    async fn report(&self, outcome: &ApplicationOutcome) -> Result<(), ApiError>;
}
