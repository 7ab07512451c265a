//! 落地页解析 (Redirect Unwinder)
//!
//! 将营销中间页还原为真实目标链接。平台域名与自有域名原样返回；
//! `/landing/` 页面按三条有序模式抽取并写入缓存；拼多多推广页直接合成商品链接。

use std::sync::OnceLock;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::debug;
use url::Url;

use super::classify::is_platform_host;
use super::strategy::{Capture, Hit, Pattern, first_hit, html_entities, js_escapes};
use crate::core::error::{ResolveError, Result};
use crate::interfaces::{Page, PageRequest};
use crate::network::ServiceContext;
use crate::utils::{clean_path, has_param, parse_link};

const PDD_GOODS_URL: &str = "https://mobile.yangkeduo.com/goods.html?goods_id=";

struct LandingPatterns {
    /// `/landing/` 页面
    landing: Vec<Pattern>,
    /// 其余中间页
    pdd_goods: Vec<Pattern>,
}

impl LandingPatterns {
    fn get() -> &'static LandingPatterns {
        static INSTANCE: OnceLock<LandingPatterns> = OnceLock::new();
        INSTANCE.get_or_init(|| LandingPatterns {
            landing: vec![
                Pattern::new("anchor_href", r#"<a\s+href="(https://.+?)""#, Capture::Link)
                    .decoded(html_entities),
                Pattern::new("js_link", r#",link:"(https.+?)","#, Capture::Link)
                    .decoded(js_escapes),
                Pattern::new("open_url", r"openUrl\('(https.+?)'\)", Capture::Link)
                    .decoded(js_escapes),
            ],
            pdd_goods: vec![Pattern::new(
                "pdd_goods",
                r"(https://mobile\.yangkeduo\.com/goods\.html\?goods_id=\d+)",
                Capture::Link,
            )],
        })
    }
}

/// 还原中间页链接
///
/// `ttl_secs > 0` 时先查缓存，`/landing/` 分支命中后回写缓存。
pub async fn resolve_link(ctx: &ServiceContext, link: &str, ttl_secs: u64) -> Result<String> {
    let url = parse_link(link)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Ok(link.to_string());
    }

    let host = url.host_str().unwrap_or_default();
    if ctx.config.first_party.owns(host) || is_platform_host(host) {
        return Ok(link.to_string());
    }

    if ttl_secs > 0
        && let Some(hit) = ctx.cached_link(link).await
    {
        debug!("落地页缓存命中: {} -> {}", link, hit);
        return Ok(hit);
    }

    if clean_path(url.path()).starts_with("/landing/") {
        let page = fetch(ctx, &url, "landing_page").await?;
        let resolved = extract(&LandingPatterns::get().landing, &page)?;
        if ttl_secs > 0 {
            ctx.remember_link(link, &resolved, ttl_secs).await;
        }
        return Ok(resolved);
    }

    if url.path().contains("pddpage") && has_param(&url, "goodsId") {
        let goods_id = url
            .query_pairs()
            .find(|(k, _)| k == "goodsId")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        return Ok(format!(
            "{}{}",
            PDD_GOODS_URL,
            utf8_percent_encode(&goods_id, NON_ALPHANUMERIC)
        ));
    }

    let page = fetch(ctx, &url, "landing_scan").await?;
    extract(&LandingPatterns::get().pdd_goods, &page)
}

async fn fetch(ctx: &ServiceContext, url: &Url, step: &'static str) -> Result<Page> {
    ctx.fetch(PageRequest::new(url.clone()))
        .await
        .map_err(|e| e.during(step, url.as_str()))
}

fn extract(patterns: &[Pattern], page: &Page) -> Result<String> {
    match first_hit(patterns, &page.body) {
        Some((name, Hit::Link(link))) => {
            debug!("落地页 [{}] 命中: {}", name, link);
            Ok(link)
        }
        _ => Err(ResolveError::LandingNotFound(page.url.to_string())),
    }
}
