use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};

use crate::core::config::HttpConfig;
use crate::core::error::{ResolveError, Result};
use crate::interfaces::{Page, PageRequest, Transport};
use crate::network::middleware::ProfileMiddleware;
use crate::network::session::RequestProfile;

/// 基于 reqwest 的传输层实现
#[derive(Clone)]
pub struct HttpService {
    client: ClientWithMiddleware,
    config: Arc<HttpConfig>,
}

impl HttpService {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let config = Arc::new(config);
        let client = Self::try_build_internal_client(&config, None)?;
        Ok(Self { client, config })
    }

    /// 构建底层的 HTTP 客户端
    ///
    /// 传入 Jar 时启用 Cookie 存储，否则客户端无状态。
    fn try_build_internal_client(
        config: &HttpConfig,
        jar: Option<Arc<Jar>>,
    ) -> Result<ClientWithMiddleware> {
        let mut headers = HeaderMap::new();
        if let Ok(ua) = HeaderValue::from_str(&config.user_agent) {
            headers.insert(USER_AGENT, ua);
        }

        let mut client_builder = reqwest::Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .tcp_nodelay(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs));

        if let Some(jar) = jar {
            client_builder = client_builder.cookie_provider(jar);
        }

        let client = client_builder.build().map_err(ResolveError::Network)?;

        Ok(ClientBuilder::new(client).with(ProfileMiddleware).build())
    }
}

#[async_trait]
impl Transport for HttpService {
    async fn fetch(&self, req: PageRequest) -> Result<Page> {
        let target = req.url.to_string();
        let resp = self
            .client
            .get(req.url.clone())
            .with_extension(RequestProfile::from_request(&req))
            .send()
            .await
            .map_err(|e| ResolveError::from_middleware(e, &target))?;

        let url = resp.url().clone();
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| ResolveError::from_reqwest(e, &target))?;

        Ok(Page { url, status, body })
    }

    fn isolated(&self) -> Result<Arc<dyn Transport>> {
        let jar = Arc::new(Jar::default());
        let client = Self::try_build_internal_client(&self.config, Some(jar))?;
        Ok(Arc::new(Self {
            client,
            config: self.config.clone(),
        }))
    }
}
