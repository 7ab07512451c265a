//! 解析引擎 (Resolution Engine)
//!
//! 对外暴露四个入口：落地页还原、淘宝客链接拆解、直达链接解码与通用商品解析。
//! 所有副作用经由 [`ServiceContext`]，引擎本身不持有全局状态。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

use crate::core::config::ResolverConfig;
use crate::core::error::{ErrorKind, ResolveError, Result};
use crate::core::model::{AffiliateLink, ItemRef, Platform};
use crate::interfaces::LinkCache;
use crate::network::{HttpService, ServiceContext};
use crate::sites::SiteRegistry;
use crate::sites::taobao::resolve_click;
use crate::utils::{first_id, parse_id, parse_link, query_param, unescape_html};

pub mod classify;
pub mod landing;
pub mod scheme;
pub mod strategy;
pub mod walker;

use scheme::Decoded;
use walker::Budget;

const AFFILIATE_HOST: &str = "s.click.taobao.com";

/// 链接解析器
#[derive(Clone)]
pub struct Resolver {
    ctx: ServiceContext,
    registry: Arc<SiteRegistry>,
}

impl Resolver {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            registry: Arc::new(SiteRegistry::new()),
        }
    }

    /// 以 reqwest 传输层构建
    pub fn from_config(config: ResolverConfig) -> Result<Self> {
        let http = HttpService::new(config.http.clone())?;
        Ok(Self::new(ServiceContext::new(Arc::new(http), Arc::new(config))))
    }

    pub fn with_cache(mut self, cache: Arc<dyn LinkCache>) -> Self {
        self.ctx = self.ctx.with_cache(cache);
        self
    }

    /// 派生一个绑定调用方取消令牌的解析器
    pub fn scoped(&self, token: CancellationToken) -> Self {
        Self {
            ctx: self.ctx.clone().with_shutdown(token),
            registry: self.registry.clone(),
        }
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    // =========================================================================
    // 入口
    // =========================================================================

    /// 还原营销中间页，`ttl_secs` 为 0 时不读写缓存
    pub async fn resolve_link(&self, link: &str, ttl_secs: u64) -> Result<String> {
        landing::resolve_link(&self.ctx, link, ttl_secs).await
    }

    /// 拆解淘宝客链接：还原原始商品链接并提取推广位字段
    pub async fn resolve_affiliate_link(&self, link: &str) -> Result<AffiliateLink> {
        let unwound = landing::resolve_link(&self.ctx, link, 0).await?;
        let mut parsed = parse_link(&unwound)?;

        if parsed.host_str() != Some(AFFILIATE_HOST) {
            let page = query_param(&parsed, "page")
                .ok_or_else(|| ResolveError::NotAffiliate(unwound.clone()))?;
            parsed = parse_link(&page)?;
            if parsed.host_str() != Some(AFFILIATE_HOST) {
                return Err(ResolveError::NotAffiliate(page));
            }
        }

        let affiliate_url = parsed.to_string();
        let original_url = resolve_click(&self.ctx, &parsed).await?;

        let track = query_param(&original_url, "ali_trackid").unwrap_or_default();
        let parts: Vec<&str> = track.split(':').collect();
        if parts.len() != 3 {
            return Err(ResolveError::MalformedTracking {
                affiliate_url,
                original_url: original_url.to_string(),
                value: track,
            });
        }

        let sub_tracking_id = parts[1].to_string();
        info!("淘宝客链接解析完成: {} (sub: {})", original_url, sub_tracking_id);
        Ok(AffiliateLink {
            affiliate_url,
            original_url,
            sub_tracking_id,
        })
    }

    /// 解析 App 直达链接
    pub async fn resolve_deeplink_item(&self, link: &str) -> Result<ItemRef> {
        let link = unescape_html(link);
        let url = parse_link(&link)?;
        let mut budget = Budget::new(self.ctx.config.max_depth);
        let item = self.decode_deep_link(&url, &mut budget).await?;
        info!("直达链接解析完成: {} -> {} {}", link, item.platform(), item.item_id());
        Ok(item)
    }

    /// 通用商品解析：HTTP(S) 链接先还原中间页，其余 scheme 交给直达链接解码器
    pub async fn resolve_item(&self, link: &str) -> Result<ItemRef> {
        let mut budget = Budget::new(self.ctx.config.max_depth);
        let mut link = unescape_html(link).into_owned();

        loop {
            let unwound = landing::resolve_link(&self.ctx, &link, 0).await?;
            let url = parse_link(&unwound)?;
            if !matches!(url.scheme(), "http" | "https") {
                return self.decode_deep_link(&url, &mut budget).await;
            }

            let host = url.host_str().unwrap_or_default();
            let first_party = &self.ctx.config.first_party;
            if first_party.is_share_host(host) {
                if let Some(page) = query_param(&url, "page") {
                    budget.enter(&page)?;
                    link = unescape_html(&page).into_owned();
                    continue;
                }
                return share_path_id(&url)
                    .and_then(|id| ItemRef::new(id, Platform::Unknown))
                    .ok_or(ResolveError::ItemNotFound(unwound));
            }
            if first_party.is_mall_host(host) {
                return first_id(&url, &["id", "sku_id"])
                    .and_then(|id| ItemRef::new(id, Platform::WeChat))
                    .ok_or(ResolveError::ItemNotFound(unwound));
            }

            let platform = classify::classify(&url);
            if platform == Platform::Unknown {
                return Err(ResolveError::UnsupportedHost(unwound));
            }
            let item = self.walk(platform, url, &unwound, &mut budget).await?;
            info!("商品解析完成: {} -> {} {}", link, item.platform(), item.item_id());
            return Ok(item);
        }
    }

    // =========================================================================
    // 内部流程
    // =========================================================================

    async fn decode_deep_link(&self, url: &Url, budget: &mut Budget) -> Result<ItemRef> {
        match scheme::decode(url)? {
            Decoded::Item(item) => Ok(item),
            // 内嵌页面不属于该平台时按未找到处理，调用方可继续尝试其他策略
            Decoded::Page { platform, url: page } => self
                .walk(platform, page, url.as_str(), budget)
                .await
                .map_err(|e| match e.kind() {
                    ErrorKind::Unsupported => ResolveError::ItemNotFound(url.to_string()),
                    _ => e,
                }),
        }
    }

    async fn walk(
        &self,
        platform: Platform,
        start: Url,
        origin: &str,
        budget: &mut Budget,
    ) -> Result<ItemRef> {
        walker::walk(&self.registry, &self.ctx, platform, start, budget)
            .await?
            .and_then(|id| ItemRef::new(id, platform))
            .ok_or_else(|| ResolveError::ItemNotFound(origin.to_string()))
    }
}

/// 分享页路径 `/i/<a>/<b>/<id>`
fn share_path_id(url: &Url) -> Option<u64> {
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    if segments.next()? != "i" {
        return None;
    }
    parse_id(segments.nth(2)?)
}
