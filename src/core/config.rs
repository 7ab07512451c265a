//! 配置管理系统 (Configuration Management)
//!
//! 负责 `resolver.toml` 的反序列化及环境变量覆盖，所有字段均提供默认值。

use std::path::Path;

use bon::Builder;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::core::error::{ResolveError, Result};

/// 平台敏感请求统一使用的移动端 UA
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 14_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1";

/// 全局解析器配置
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct ResolverConfig {
    /// HTTP 客户端参数
    #[serde(default)]
    #[builder(default)]
    pub http: HttpConfig,

    /// 嵌套链接的最大解析深度
    #[serde(default = "default_max_depth")]
    #[builder(default = default_max_depth())]
    pub max_depth: usize,

    /// 自有域名配置
    #[serde(default)]
    #[builder(default)]
    pub first_party: FirstPartyConfig,
}

/// HTTP 客户端配置
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout")]
    #[builder(default = default_connect_timeout())]
    pub connect_timeout_secs: u64,
    /// 单次请求总超时
    #[serde(default = "default_timeout")]
    #[builder(default = default_timeout())]
    pub timeout_secs: u64,
    #[serde(default = "default_max_redirects")]
    #[builder(default = default_max_redirects())]
    pub max_redirects: usize,
    #[serde(default = "default_pool_idle")]
    #[builder(default = default_pool_idle())]
    pub pool_max_idle_per_host: usize,
    #[serde(default = "default_user_agent")]
    #[builder(default = default_user_agent())]
    pub user_agent: String,
}

/// 自有域名 (落地页短域名、分享页、小程序商城)
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct FirstPartyConfig {
    /// 直接放行、不做跳转解析的域名后缀
    #[serde(default = "default_first_party_suffixes")]
    #[builder(default = default_first_party_suffixes())]
    pub suffixes: Vec<String>,
    /// 分享页域名，`page` 参数指向真实商品链接
    #[serde(default = "default_share_host")]
    pub share_host: Option<String>,
    /// 小程序商城域名
    #[serde(default = "default_mall_host")]
    pub mall_host: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            max_depth: default_max_depth(),
            first_party: FirstPartyConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_timeout(),
            max_redirects: default_max_redirects(),
            pool_max_idle_per_host: default_pool_idle(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for FirstPartyConfig {
    fn default() -> Self {
        Self {
            suffixes: default_first_party_suffixes(),
            share_host: default_share_host(),
            mall_host: default_mall_host(),
        }
    }
}

impl FirstPartyConfig {
    pub fn owns(&self, host: &str) -> bool {
        self.suffixes.iter().any(|s| host.ends_with(s.as_str()))
    }

    pub fn is_share_host(&self, host: &str) -> bool {
        self.share_host.as_deref() == Some(host)
    }

    pub fn is_mall_host(&self, host: &str) -> bool {
        self.mall_host.as_deref() == Some(host)
    }
}

fn default_max_depth() -> usize {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_timeout() -> u64 {
    30
}
fn default_max_redirects() -> usize {
    10
}
fn default_pool_idle() -> usize {
    32
}
fn default_user_agent() -> String {
    MOBILE_USER_AGENT.to_string()
}
fn default_first_party_suffixes() -> Vec<String> {
    vec![".xibao100.com".to_string()]
}
fn default_share_host() -> Option<String> {
    Some("xhsh.xibao100.com".to_string())
}
fn default_mall_host() -> Option<String> {
    Some("wxmall.xibao100.com".to_string())
}

impl ResolverConfig {
    /// 从工作目录下的 `resolver.toml` 及 `ECOM_LINK__*` 环境变量加载
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("resolver.toml"))
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let builder = Config::builder();

        let builder = if config_path.exists() {
            builder.add_source(File::from(config_path))
        } else {
            builder
        };

        let settings = builder
            .add_source(Environment::with_prefix("ECOM_LINK").separator("__"))
            .build()
            .map_err(ResolveError::Config)?;
        settings.try_deserialize().map_err(ResolveError::Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = ResolverConfig::load_from(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(cfg.max_depth, 5);
        assert_eq!(cfg.http.user_agent, MOBILE_USER_AGENT);
        assert!(cfg.first_party.owns("xhsh.xibao100.com"));
    }

    #[test]
    fn builder_overrides_single_field() {
        let cfg = ResolverConfig::builder().max_depth(2).build();
        assert_eq!(cfg.max_depth, 2);
        assert_eq!(cfg.http.timeout_secs, 30);
    }

    #[test]
    fn first_party_host_checks() {
        let fp = FirstPartyConfig::builder()
            .suffixes(vec![".mall.example".into()])
            .mall_host("wx.mall.example".into())
            .build();
        assert!(fp.owns("a.mall.example"));
        assert!(!fp.owns("mall.example.com"));
        assert!(fp.is_mall_host("wx.mall.example"));
        assert!(!fp.is_share_host("wx.mall.example"));
    }
}
