//! 服务上下文 (ServiceContext)
//!
//! 统一管理解析过程中的所有副作用：传输层、缓存、配置与取消令牌。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::config::ResolverConfig;
use crate::core::error::{ResolveError, Result};
use crate::interfaces::{LinkCache, Page, PageRequest, Transport, cache_key};

#[derive(Clone)]
pub struct ServiceContext {
    /// 传输层
    pub transport: Arc<dyn Transport>,
    /// 外部缓存（可选）
    pub cache: Option<Arc<dyn LinkCache>>,
    /// 应用配置
    pub config: Arc<ResolverConfig>,
    /// 取消令牌，贯穿每一次网络请求
    pub shutdown: CancellationToken,
}

impl ServiceContext {
    pub fn new(transport: Arc<dyn Transport>, config: Arc<ResolverConfig>) -> Self {
        Self {
            transport,
            cache: None,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn LinkCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    // =========================================================================
    // HTTP 请求方法
    // =========================================================================

    /// 使用共享传输层发起请求
    pub async fn fetch(&self, req: PageRequest) -> Result<Page> {
        self.fetch_via(self.transport.as_ref(), req).await
    }

    /// 使用指定传输层发起请求 (例如带独立 Cookie Jar 的会话)
    pub async fn fetch_via(&self, transport: &dyn Transport, req: PageRequest) -> Result<Page> {
        let url = req.url.to_string();
        if self.shutdown.is_cancelled() {
            return Err(ResolveError::Cancelled { url });
        }

        tokio::select! {
            _ = self.shutdown.cancelled() => Err(ResolveError::Cancelled { url }),
            page = transport.fetch(req) => page,
        }
    }

    // =========================================================================
    // 缓存操作
    // =========================================================================

    /// 查询缓存，读取失败视为未命中
    pub async fn cached_link(&self, link: &str) -> Option<String> {
        let cache = self.cache.as_ref()?;
        match cache.get(&cache_key(link)).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("缓存读取失败，按未命中处理: {}", e);
                None
            }
        }
    }

    /// 写入缓存，写入失败只记录日志
    pub async fn remember_link(&self, link: &str, resolved: &str, ttl_secs: u64) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let ttl = std::time::Duration::from_secs(ttl_secs);
        match cache.set(&cache_key(link), resolved, ttl).await {
            Ok(()) => debug!("缓存落地页解析结果: {} -> {}", link, resolved),
            Err(e) => warn!("缓存写入失败: {}", e),
        }
    }
}
