//! 错误处理体系 (Error Handling System)
//!
//! 定义链接解析相关的错误类型、错误类别以及全局 Result 别名。

use thiserror::Error;

/// 错误类别 (Error Kinds)
///
/// 调用方据此决定是否尝试其他解析策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ErrorKind {
    /// 链接无法解析为 URI
    MalformedInput,
    /// 网络层失败 (含超时、响应体无法读取)
    Transport,
    /// 所有回退模式均未命中
    NotFound,
    /// 平台/协议不在支持范围内
    Unsupported,
    /// 淘宝客追踪三元组格式错误
    MalformedTracking,
    /// 超过递归深度上限
    DepthExceeded,
    /// 调用方取消
    Cancelled,
    Cache,
    Config,
}

/// 全局错误定义 (Link Resolution Errors)
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("解析链接失败 ({link}): {source}")]
    InvalidLink {
        link: String,
        #[source]
        source: url::ParseError,
    },

    /// 嵌套查询串无法解析
    #[error("解析查询参数失败 ({link}): {reason}")]
    MalformedQuery { link: String, reason: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    #[error("请求超时: {url}")]
    Timeout { url: String },

    /// 非 reqwest 传输层 (测试桩、自定义实现) 的失败
    #[error("Transport error: {0}")]
    Transport(String),

    /// 为底层错误附加失败步骤
    #[error("下载链接内容失败 [{step}] {url}: {source}")]
    Fetch {
        step: &'static str,
        url: String,
        #[source]
        source: Box<ResolveError>,
    },

    #[error("请求已取消: {url}")]
    Cancelled { url: String },

    #[error("提取二跳链接失败: {0}")]
    LandingNotFound(String),

    #[error("无法获取淘宝客跳转链接: {0}")]
    AffiliateNotFound(String),

    #[error("无法获取商品ID, 链接: {0}")]
    ItemNotFound(String),

    #[error("非淘宝客链接: {0}")]
    NotAffiliate(String),

    #[error("未知平台链接: {0}")]
    UnsupportedScheme(String),

    #[error("不支持的平台域名: {0}")]
    UnsupportedHost(String),

    #[error("直达链接参数错误 ({scheme}): {reason}")]
    MalformedDeepLink { scheme: String, reason: String },

    #[error("invalid ali_trackid: {value:?}")]
    MalformedTracking {
        affiliate_url: String,
        original_url: String,
        value: String,
    },

    #[error("解析深度超过上限 ({limit}): {link}")]
    DepthExceeded { limit: usize, link: String },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// 全局 Result 别名
pub type Result<T> = std::result::Result<T, ResolveError>;

impl ResolveError {
    /// 错误所属类别
    ///
    /// `Fetch` 包装层按其内部错误归类。
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidLink { .. } | Self::MalformedDeepLink { .. } | Self::MalformedQuery { .. } => {
                ErrorKind::MalformedInput
            }
            Self::Network(_) | Self::Middleware(_) | Self::Timeout { .. } | Self::Transport(_) => {
                ErrorKind::Transport
            }
            Self::Fetch { source, .. } => source.kind(),
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::LandingNotFound(_) | Self::AffiliateNotFound(_) | Self::ItemNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::NotAffiliate(_) | Self::UnsupportedScheme(_) | Self::UnsupportedHost(_) => {
                ErrorKind::Unsupported
            }
            Self::MalformedTracking { .. } => ErrorKind::MalformedTracking,
            Self::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            Self::Cache(_) => ErrorKind::Cache,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// 标注失败步骤
    pub fn during(self, step: &'static str, url: impl Into<String>) -> Self {
        Self::Fetch {
            step,
            url: url.into(),
            source: Box::new(self),
        }
    }

    /// 将 reqwest 层错误映射为领域错误，超时单独归类
    pub(crate) fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            Self::Timeout { url: url.to_string() }
        } else {
            Self::Network(err)
        }
    }

    pub(crate) fn from_middleware(err: reqwest_middleware::Error, url: &str) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => Self::from_reqwest(e, url),
            other => Self::Middleware(other),
        }
    }
}
