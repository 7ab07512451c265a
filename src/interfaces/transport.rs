use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::core::error::Result;

/// 单次 GET 请求描述
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub url: Url,
    /// 覆盖客户端默认 UA
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

impl PageRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            user_agent: None,
            referer: None,
        }
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }
}

/// 已跟随重定向的响应
#[derive(Debug, Clone)]
pub struct Page {
    /// 最终生效的 URL (重定向之后)
    pub url: Url,
    pub status: u16,
    pub body: String,
}

/// 传输层接口
///
/// - 负责：发起 GET、跟随 HTTP 重定向、读取响应体。
/// - 不负责：重试。失败直接向上传播。
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, req: PageRequest) -> Result<Page>;

    /// 派生一个持有全新空 Cookie Jar 的传输层，生命周期限定在一次解析内
    fn isolated(&self) -> Result<Arc<dyn Transport>>;
}
