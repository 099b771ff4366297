use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时驱动的页面数量
    pub max_concurrent_pages: usize,
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 是否启动无头浏览器（否则连接到已运行的浏览器）
    pub headless: bool,
    /// 无头模式下的浏览器可执行文件路径，为空时由 chromiumoxide 自动查找
    pub chrome_executable: Option<String>,
    /// 要打开的职位页面；为空时接管浏览器里已经打开的标签页
    pub target_urls: Vec<String>,
    /// 站点注册表 TOML 文件；为空时使用内置注册表
    pub sites_file: Option<String>,
    /// 本地投递结果日志文件
    pub output_log_file: String,
    // --- 后端 API 配置 ---
    pub api_base_url: String,
    /// 直接指定的 bearer token，优先于 token 文件
    pub auth_token: Option<String>,
    /// 认证子系统写入 token 的文件
    pub auth_token_file: String,
    // --- 时序配置（毫秒） ---
    /// 等待申请按钮出现的上限
    pub trigger_timeout_ms: u64,
    /// 点击申请按钮后等待表单出现的上限
    pub form_wait_timeout_ms: u64,
    /// 点击提交前等待页面校验逻辑稳定的时间
    pub submit_settle_delay_ms: u64,
    /// 后端请求超时
    pub request_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_pages: 8,
            browser_debug_port: 2001,
            headless: false,
            chrome_executable: None,
            target_urls: Vec::new(),
            sites_file: None,
            output_log_file: "output.txt".to_string(),
            api_base_url: "http://localhost:5000/api".to_string(),
            auth_token: None,
            auth_token_file: ".auto_apply_token".to_string(),
            trigger_timeout_ms: 10_000,
            form_wait_timeout_ms: 2_000,
            submit_settle_delay_ms: 500,
            request_timeout_ms: 30_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_pages: parse_var("MAX_CONCURRENT_PAGES", default.max_concurrent_pages),
            browser_debug_port: parse_var("BROWSER_DEBUG_PORT", default.browser_debug_port),
            headless: parse_var("HEADLESS", default.headless),
            chrome_executable: non_empty_var("CHROME_EXECUTABLE"),
            target_urls: std::env::var("TARGET_URLS")
                .map(|v| split_list(&v))
                .unwrap_or(default.target_urls),
            sites_file: non_empty_var("SITES_FILE"),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(default.api_base_url),
            auth_token: non_empty_var("AUTH_TOKEN"),
            auth_token_file: std::env::var("AUTH_TOKEN_FILE").unwrap_or(default.auth_token_file),
            trigger_timeout_ms: parse_var("TRIGGER_TIMEOUT_MS", default.trigger_timeout_ms),
            form_wait_timeout_ms: parse_var("FORM_WAIT_TIMEOUT_MS", default.form_wait_timeout_ms),
            submit_settle_delay_ms: parse_var(
                "SUBMIT_SETTLE_DELAY_MS",
                default.submit_settle_delay_ms,
            ),
            request_timeout_ms: parse_var("REQUEST_TIMEOUT_MS", default.request_timeout_ms),
        }
    }

    pub fn trigger_timeout(&self) -> Duration {
        Duration::from_millis(self.trigger_timeout_ms)
    }

    pub fn form_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.form_wait_timeout_ms)
    }

    pub fn submit_settle_delay(&self) -> Duration {
        Duration::from_millis(self.submit_settle_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// 读取并解析环境变量，解析失败时记录警告并使用默认值
fn parse_var<T: FromStr>(var_name: &str, default: T) -> T {
    match std::env::var(var_name) {
        Ok(value) => parse_value(var_name, &value).unwrap_or_else(|e| {
            warn!("⚠️ {}，使用默认值", e);
            default
        }),
        Err(_) => default,
    }
}

fn parse_value<T: FromStr>(var_name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: std::any::type_name::<T>().to_string(),
        })
}

fn non_empty_var(var_name: &str) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
