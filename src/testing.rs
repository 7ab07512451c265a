//! 测试桩 (Test Doubles)
//!
//! 以 URL 为键返回预置响应，并记录请求序列，用于在无网络环境下覆盖各条站点规则。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use crate::cache::MemoryCache;
use crate::core::config::ResolverConfig;
use crate::core::error::{ResolveError, Result};
use crate::interfaces::{LinkCache, Page, PageRequest, Transport};
use crate::network::ServiceContext;

#[derive(Default)]
struct Routes {
    pages: HashMap<String, Page>,
    requests: Vec<PageRequest>,
    sessions: usize,
}

/// 预置响应的传输层
#[derive(Clone, Default)]
pub struct StubTransport {
    inner: Arc<Mutex<Routes>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求 `url` 时原地返回 `body`
    pub fn page(self, url: &str, body: &str) -> Self {
        self.redirect(url, url, body)
    }

    /// 请求 `url` 时模拟重定向至 `effective`
    pub fn redirect(self, url: &str, effective: &str, body: &str) -> Self {
        let page = Page {
            url: Url::parse(effective).unwrap(),
            status: 200,
            body: body.to_string(),
        };
        self.inner.lock().pages.insert(normalize(url), page);
        self
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.inner.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner.lock().requests.len()
    }

    pub fn sessions(&self) -> usize {
        self.inner.lock().sessions
    }

    pub fn context(&self) -> ServiceContext {
        self.context_with(ResolverConfig::default())
    }

    pub fn context_with(&self, config: ResolverConfig) -> ServiceContext {
        self.context_with_cache(config, Arc::new(MemoryCache::new()))
    }

    pub fn context_with_cache(
        &self,
        config: ResolverConfig,
        cache: Arc<dyn LinkCache>,
    ) -> ServiceContext {
        ServiceContext::new(Arc::new(self.clone()), Arc::new(config)).with_cache(cache)
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl Transport for StubTransport {
    async fn fetch(&self, req: PageRequest) -> Result<Page> {
        let mut routes = self.inner.lock();
        let key = req.url.to_string();
        routes.requests.push(req);
        routes
            .pages
            .get(&key)
            .cloned()
            .ok_or_else(|| ResolveError::Transport(format!("no route for {}", key)))
    }

    fn isolated(&self) -> Result<Arc<dyn Transport>> {
        self.inner.lock().sessions += 1;
        Ok(Arc::new(self.clone()))
    }
}

/// 读写都失败的缓存，记录调用次数
#[derive(Default)]
pub struct BrokenCache {
    calls: Mutex<(usize, usize)>,
}

impl BrokenCache {
    /// (读次数, 写次数)
    pub fn calls(&self) -> (usize, usize) {
        *self.calls.lock()
    }
}

#[async_trait]
impl LinkCache for BrokenCache {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        self.calls.lock().0 += 1;
        Err(ResolveError::Cache("read refused".into()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        self.calls.lock().1 += 1;
        Err(ResolveError::Cache("write refused".into()))
    }
}
