//! 请求画像 (Request Profile)
//!
//! 单次请求需要覆盖的身份头部，经由请求扩展传递给中间件注入。

use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};

use crate::interfaces::PageRequest;

#[derive(Debug, Clone, Default)]
pub struct RequestProfile {
    /// 浏览器指纹 (User-Agent)
    pub ua: Option<String>,
    pub referer: Option<String>,
}

impl RequestProfile {
    pub fn from_request(req: &PageRequest) -> Self {
        Self {
            ua: req.user_agent.clone(),
            referer: req.referer.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ua.is_none() && self.referer.is_none()
    }

    /// 写入请求头，非法头值直接忽略
    pub fn apply(&self, headers: &mut HeaderMap) {
        let pairs = [(USER_AGENT, &self.ua), (REFERER, &self.referer)];
        for (name, value) in pairs {
            if let Some(v) = value
                && let Ok(val) = HeaderValue::from_str(v)
            {
                headers.insert(name, val);
            }
        }
    }
}
