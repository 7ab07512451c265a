//! 平台提取器 (Per-Platform Item-ID Extractors)
//!
//! 每个平台实现一张按域名分发的规则表。单条规则只做一步：
//! 直接得到商品 ID、给出下一跳链接、或判定未找到。递归由引擎的工作队列驱动。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::core::error::Result;
use crate::core::model::Platform;
use crate::network::ServiceContext;

pub mod jd;
pub mod meituan;
pub mod pdd;
pub mod taobao;

/// 单步提取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Found(u64),
    /// 同一平台规则下继续解析嵌套链接
    Follow(Url),
    /// 交由直达链接解码器处理，仅接受同平台结果
    DeepLink(String),
    NotFound,
}

impl Step {
    /// 0 不是合法 ID
    pub fn from_id(id: Option<u64>) -> Self {
        match id {
            Some(id) if id > 0 => Self::Found(id),
            _ => Self::NotFound,
        }
    }

    /// 解析失败的嵌套链接按未找到处理
    pub fn follow(raw: &str) -> Self {
        Url::parse(raw).map(Self::Follow).unwrap_or(Self::NotFound)
    }
}

/// 平台提取器 Trait
#[async_trait]
pub trait Extractor: Send + Sync {
    fn platform(&self) -> Platform;

    /// 对已确认属于本平台的链接执行一步规则
    async fn step(&self, url: &Url, ctx: &ServiceContext) -> Result<Step>;
}

// ============================================================================
// 提取器注册表
// ============================================================================

pub struct SiteRegistry {
    extractors: HashMap<Platform, Arc<dyn Extractor>>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            extractors: HashMap::new(),
        };
        registry.register(Arc::new(taobao::Taobao));
        registry.register(Arc::new(jd::Jd));
        registry.register(Arc::new(pdd::Pdd));
        registry.register(Arc::new(meituan::Meituan));
        registry
    }

    pub fn register(&mut self, extractor: Arc<dyn Extractor>) {
        self.extractors.insert(extractor.platform(), extractor);
    }

    pub fn get(&self, platform: Platform) -> Option<Arc<dyn Extractor>> {
        self.extractors.get(&platform).cloned()
    }

    pub fn list(&self) -> Vec<Platform> {
        self.extractors.keys().copied().collect()
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}
