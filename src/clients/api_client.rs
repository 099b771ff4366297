//! 后端 API 客户端
//!
//! 封装 `/apply/generate` 与 `/apply/log` 两个接口，请求都带 bearer token 和超时

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clients::contract::{MaterialsService, OutcomeReporter};
use crate::clients::credentials::CredentialStore;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{ApplicationMaterials, ApplicationOutcome, GeneratedMaterials, JobDetails};

pub const GENERATE_ENDPOINT: &str = "/apply/generate";
pub const LOG_ENDPOINT: &str = "/apply/log";

/// 后端没有给出错误信息时使用的文案
const UNKNOWN_ERROR: &str = "Unknown error";

/// 后端错误响应体
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// 后端 API 客户端
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
    /// 创建新的 API 客户端
    pub fn new(config: &Config, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// 发送 JSON POST 请求，返回状态码和原始响应体
    async fn post<T: Serialize + Sync + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<(u16, String), ApiError> {
        let token = self
            .credentials
            .token()
            .await
            .ok_or(ApiError::MissingCredential)?;

        let url = format!("{}{}", self.base_url, endpoint);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::connectivity(endpoint, describe_transport_error(&e)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::connectivity(endpoint, describe_transport_error(&e)))?;

        debug!("{} 返回 {}: {} 字节", endpoint, status, text.len());
        Ok((status, text))
    }
}

#[async_trait]
impl MaterialsService for ApiClient {
    async fn request_materials(&self, job: &JobDetails) -> Result<ApplicationMaterials, ApiError> {
        let (status, body) = self.post(GENERATE_ENDPOINT, job).await?;
        let materials = parse_generate_response(status, &body)?;
        info!(
            "✓ 已生成申请材料: 求职信 {} 字符",
            materials.cover_letter.chars().count()
        );
        Ok(materials)
    }
}

#[async_trait]
impl OutcomeReporter for ApiClient {
    async fn report(&self, outcome: &ApplicationOutcome) -> Result<(), ApiError> {
        let (status, body) = self.post(LOG_ENDPOINT, outcome).await?;
        parse_log_response(status, &body)
    }
}

/// 解析 `/apply/generate` 的响应
pub fn parse_generate_response(status: u16, body: &str) -> Result<ApplicationMaterials, ApiError> {
    if !is_success(status) {
        return Err(service_error(GENERATE_ENDPOINT, status, body));
    }

    let generated: GeneratedMaterials = serde_json::from_str(body)
        .map_err(|e| ApiError::parse(GENERATE_ENDPOINT, format!("invalid JSON body: {}", e)))?;

    generated
        .validate()
        .map_err(|field| ApiError::parse(GENERATE_ENDPOINT, format!("missing field `{}`", field)))
}

/// 解析 `/apply/log` 的响应，后端约定返回 201，其他 2xx 也视为成功
pub fn parse_log_response(status: u16, body: &str) -> Result<(), ApiError> {
    if !is_success(status) {
        return Err(service_error(LOG_ENDPOINT, status, body));
    }
    if status != 201 {
        debug!("{} 返回了 {} 而不是 201", LOG_ENDPOINT, status);
    }
    Ok(())
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn service_error(endpoint: &str, status: u16, body: &str) -> ApiError {
    ApiError::Service {
        endpoint: endpoint.to_string(),
        status,
        message: error_message(body),
    }
}

/// 从错误响应体中取出 `message`，取不到时使用 "Unknown error"
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else {
        e.to_string()
    }
}
