use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),
    /// 后端 API 调用错误
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    /// 站点注册表错误
    #[error("site registry error: {0}")]
    Registry(#[from] RegistryError),
    /// 配置错误
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("cannot connect to browser on port {port}: {source}")]
    ConnectionFailed {
        port: u16,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建页面失败
    #[error("failed to create page: {source}")]
    PageCreationFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 导航失败
    #[error("failed to navigate to {url}: {source}")]
    NavigationFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 浏览器配置失败
    #[error("invalid browser configuration: {message}")]
    ConfigurationFailed { message: String },
}

/// 后端 API 调用错误
///
/// `/apply/generate` 与 `/apply/log` 共用，错误信息会原样进入结果记录的 details
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 凭据库中没有 token
    #[error("authentication token not found, please log in")]
    MissingCredential,
    /// 网络请求失败（包括超时）
    #[error("network error calling {endpoint}: {message}")]
    Connectivity { endpoint: String, message: String },
    /// 后端返回非 2xx 状态
    #[error("service error {status} from {endpoint}: {message}")]
    Service {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// 响应体缺少必需字段或不是 JSON
    #[error("malformed response from {endpoint}: {message}")]
    Parse { endpoint: String, message: String },
}

/// 简历注入错误
///
/// 浏览器经常禁止脚本给 file input 赋值，`PlatformRestricted` 是预期内会出现的失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileInjectionError {
    /// 页面上找不到简历上传控件
    #[error("resume file input not found ({locator})")]
    InputNotFound { locator: String },
    /// 拉取简历文件失败
    #[error("could not fetch resume from {url}: {message}")]
    FetchFailed { url: String, message: String },
    /// 浏览器安全策略拒绝了文件赋值
    #[error("browser refused programmatic file assignment: {0}")]
    PlatformRestricted(String),
    /// 页面通信失败
    #[error("page error: {0}")]
    Page(String),
}

/// 站点注册表错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// 注册表为空
    #[error("site registry is empty")]
    Empty,
    /// 域名片段为空
    #[error("site '{site}' has an empty domain fragment")]
    EmptyDomain { site: String },
    /// 重复的域名片段
    #[error("domain fragment '{domain}' is registered more than once")]
    DuplicateDomain { domain: String },
    /// 一个域名片段包含另一个，同一个 hostname 会命中两个条目
    #[error("domain fragment '{inner}' ({inner_site}) is contained in '{outer}' ({outer_site})")]
    OverlappingDomains {
        inner: String,
        inner_site: String,
        outer: String,
        outer_site: String,
    },
    /// TOML 解析失败
    #[error("cannot parse site registry {path}: {message}")]
    TomlParseFailed { path: String, message: String },
}

/// 配置错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("environment variable {var_name}: value '{value}' is not a valid {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

/// 单次投递流程的致命错误
///
/// Display 即写入结果记录的 details，前缀标明出错的阶段
#[derive(Debug, Error)]
pub enum RunError {
    #[error("materials request failed: {0}")]
    Materials(#[from] ApiError),
    #[error("resume upload failed: {0}")]
    ResumeUpload(#[from] FileInjectionError),
    #[error("submit control not found")]
    SubmitControlMissing,
    #[error("auto-apply process failed: {0:#}")]
    Unexpected(#[from] anyhow::Error),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建页面创建错误
    pub fn page_creation_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Browser(BrowserError::PageCreationFailed {
            source: Box::new(source),
        })
    }

    /// 创建导航错误
    pub fn navigation_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::NavigationFailed {
            url: url.into(),
            source: Box::new(source),
        })
    }
}

impl ApiError {
    /// 创建网络错误
    pub fn connectivity(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Connectivity {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// 创建响应解析错误
    pub fn parse(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Parse {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
