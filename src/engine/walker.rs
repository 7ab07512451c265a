//! 有界工作队列 (Bounded Worklist)
//!
//! 平台规则只给出单步结果，这里负责循环推进并限制总跳数，
//! 保证循环跳转的内容也能终止。

use tracing::debug;
use url::Url;

use super::scheme::{self, Decoded};
use crate::core::error::{ResolveError, Result};
use crate::core::model::Platform;
use crate::network::ServiceContext;
use crate::sites::{SiteRegistry, Step};

/// 单次解析共享的深度预算
#[derive(Debug, Clone)]
pub struct Budget {
    limit: usize,
    used: usize,
}

impl Budget {
    pub fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    /// 进入下一跳，超过上限时报错
    pub fn enter(&mut self, link: &str) -> Result<()> {
        if self.used >= self.limit {
            return Err(ResolveError::DepthExceeded {
                limit: self.limit,
                link: link.to_string(),
            });
        }
        self.used += 1;
        Ok(())
    }

    pub fn used(&self) -> usize {
        self.used
    }
}

/// 以指定平台的规则表驱动解析，直到得到商品 ID 或规则穷尽
pub async fn walk(
    registry: &SiteRegistry,
    ctx: &ServiceContext,
    platform: Platform,
    start: Url,
    budget: &mut Budget,
) -> Result<Option<u64>> {
    let extractor = registry
        .get(platform)
        .ok_or_else(|| ResolveError::UnsupportedHost(start.to_string()))?;

    let mut current = start;
    loop {
        budget.enter(current.as_str())?;
        debug!("[{}] 第 {} 跳: {}", platform, budget.used(), current);

        match extractor.step(&current, ctx).await? {
            Step::Found(id) => return Ok(Some(id)),
            Step::Follow(next) => current = next,
            Step::DeepLink(raw) => return Ok(deep_link_item(&raw, platform)),
            Step::NotFound => return Ok(None),
        }
    }
}

/// 嵌套直达链接只接受同平台的商品，解码失败视为未找到
fn deep_link_item(raw: &str, platform: Platform) -> Option<u64> {
    match scheme::decode_str(raw) {
        Ok(Decoded::Item(item)) if item.platform() == platform => Some(item.item_id()),
        Ok(_) => None,
        Err(e) => {
            debug!("忽略嵌套直达链接 {}: {}", raw, e);
            None
        }
    }
}
