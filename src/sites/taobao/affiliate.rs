//! 淘宝客跳转解析 (Affiliate Click Resolver)
//!
//! 两跳协议，共用一个全新的 Cookie 会话：
//! 1. 探测：读取页面中的 `real_jump_address`，缺失时从页面锚点/节点直接找商品；
//! 2. 跟随：携带 Referer 请求跳转地址，检查最终 URL，必要时再扫描页面。
//!
//! 第一跳已得到商品时不再发起第二跳。失败不重试。

use std::sync::OnceLock;

use regex::Regex;
use scraper::Html;
use tracing::debug;
use url::Url;

use super::selectors::SiteSelectors;
use crate::core::config::MOBILE_USER_AGENT;
use crate::core::error::{ResolveError, Result};
use crate::interfaces::{Page, PageRequest};
use crate::network::ServiceContext;
use crate::utils::{first_id, has_param, parse_id, parse_link, unescape_html};

/// 商品详情页模板
pub const DETAIL_URL: &str = "https://h5.m.taobao.com/awp/core/detail.htm?id=";

/// 最终 URL 上可能携带商品 ID 的参数
pub const ITEM_PARAMS: &[&str] = &["itemId", "item_id", "id"];

/// 第一跳结果
#[derive(Debug, PartialEq, Eq)]
enum Probe {
    /// 需要继续跟随的跳转地址
    Jump(Url),
    /// 页面内直接找到的商品链接
    Item(Url),
}

/// 将淘宝客点击链接还原为原始商品链接
pub async fn resolve_click(ctx: &ServiceContext, link: &Url) -> Result<Url> {
    let session = ctx.transport.isolated()?;

    let first = ctx
        .fetch_via(
            session.as_ref(),
            PageRequest::new(link.clone()).with_user_agent(MOBILE_USER_AGENT),
        )
        .await
        .map_err(|e| e.during("tbk_probe", link.as_str()))?;

    let jump = match probe(&first)? {
        Probe::Item(url) => {
            debug!("淘宝客第一跳直接命中商品: {}", url);
            return Ok(url);
        }
        Probe::Jump(url) => url,
    };
    debug!("淘宝客跳转地址: {}", jump);

    let referer = jump.to_string();
    let second = ctx
        .fetch_via(
            session.as_ref(),
            PageRequest::new(jump)
                .with_user_agent(MOBILE_USER_AGENT)
                .with_referer(referer.clone()),
        )
        .await
        .map_err(|e| e.during("tbk_follow", referer))?;

    if first_id(&second.url, ITEM_PARAMS).is_some() {
        return Ok(second.url);
    }
    Ok(scan_follow_page(&second).unwrap_or(second.url))
}

fn real_jump_address() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"var real_jump_address = '(.+)'").unwrap())
}

fn probe(page: &Page) -> Result<Probe> {
    if let Some(caps) = real_jump_address().captures(&page.body) {
        let raw = unescape_html(&caps[1]);
        return parse_link(&raw).map(Probe::Jump);
    }

    let doc = Html::parse_document(&page.body);
    let s = SiteSelectors::get();

    let anchor = doc
        .select(&s.anchor)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| page.url.join(href).ok())
        .find(|u| first_id(u, &["itemId", "item_id"]).is_some());
    if let Some(url) = anchor {
        return Ok(Probe::Item(url));
    }

    item_div_link(&doc)
        .map(Probe::Item)
        .ok_or_else(|| ResolveError::AffiliateNotFound(page.url.to_string()))
}

/// 第二跳页面：锚点只要带有商品参数即可，不校验取值
fn scan_follow_page(page: &Page) -> Option<Url> {
    let doc = Html::parse_document(&page.body);
    let s = SiteSelectors::get();

    doc.select(&s.anchor)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| page.url.join(href).ok())
        .find(|u| has_param(u, "itemId") || has_param(u, "item_id"))
        .or_else(|| item_div_link(&doc))
}

/// `<div item_id="...">` 合成详情页链接
fn item_div_link(doc: &Html) -> Option<Url> {
    doc.select(&SiteSelectors::get().item_div)
        .filter_map(|div| div.value().attr("item_id"))
        .find_map(|raw| parse_id(raw.trim()))
        .and_then(|id| Url::parse(&format!("{}{}", DETAIL_URL, id)).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubTransport;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn page(at: &str, body: &str) -> Page {
        Page {
            url: url(at),
            status: 200,
            body: body.to_string(),
        }
    }

    #[test]
    fn probe_prefers_real_jump_address() {
        let p = page(
            "https://s.click.taobao.com/t?e=1",
            "<script>var real_jump_address = 'https://uland.taobao.com/a?x=1&amp;y=2'</script>\
             <a href=\"https://detail.tmall.com/item.htm?itemId=5\">",
        );
        assert_eq!(
            probe(&p).unwrap(),
            Probe::Jump(url("https://uland.taobao.com/a?x=1&y=2"))
        );
    }

    #[test]
    fn probe_falls_back_to_anchor_then_div() {
        let p = page(
            "https://s.click.taobao.com/t",
            r#"<a href="/help">h</a><a href="https://a.m.taobao.com/i.htm?itemId=abc">x</a>
               <a href="https://a.m.taobao.com/i.htm?item_id=66">y</a>"#,
        );
        assert_eq!(
            probe(&p).unwrap(),
            Probe::Item(url("https://a.m.taobao.com/i.htm?item_id=66"))
        );

        let p = page(
            "https://s.click.taobao.com/t",
            r#"<div class="card" item_id="x"></div><div item_id=" 88 "></div>"#,
        );
        assert_eq!(
            probe(&p).unwrap(),
            Probe::Item(url("https://h5.m.taobao.com/awp/core/detail.htm?id=88"))
        );
    }

    #[test]
    fn probe_without_any_hint_is_not_found() {
        let p = page("https://s.click.taobao.com/t", "<html><body>nothing</body></html>");
        let err = probe(&p).unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn direct_item_skips_second_hop() {
        let stub = StubTransport::new().page(
            "https://s.click.taobao.com/t?e=1",
            r#"<div item_id="123"></div>"#,
        );
        let ctx = stub.context();
        let resolved = resolve_click(&ctx, &url("https://s.click.taobao.com/t?e=1"))
            .await
            .unwrap();
        assert_eq!(resolved.as_str(), "https://h5.m.taobao.com/awp/core/detail.htm?id=123");
        assert_eq!(stub.request_count(), 1);
        assert_eq!(stub.sessions(), 1);
    }

    #[tokio::test]
    async fn second_hop_sends_referer_and_reads_effective_url() {
        let stub = StubTransport::new()
            .page(
                "https://s.click.taobao.com/t?e=2",
                "var real_jump_address = 'https://s.click.taobao.com/t_js?tu=abc'",
            )
            .redirect(
                "https://s.click.taobao.com/t_js?tu=abc",
                "https://detail.tmall.com/item.htm?id=456&ali_trackid=2:mm_1_2_3:99",
                "",
            );
        let ctx = stub.context();
        let resolved = resolve_click(&ctx, &url("https://s.click.taobao.com/t?e=2"))
            .await
            .unwrap();
        assert_eq!(first_id(&resolved, ITEM_PARAMS), Some(456));

        let requests = stub.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1].referer.as_deref(),
            Some("https://s.click.taobao.com/t_js?tu=abc")
        );
        assert!(
            requests
                .iter()
                .all(|r| r.user_agent.as_deref() == Some(MOBILE_USER_AGENT))
        );
    }

    #[tokio::test]
    async fn second_hop_scans_page_when_url_has_no_item() {
        let stub = StubTransport::new()
            .page(
                "https://s.click.taobao.com/t?e=3",
                "var real_jump_address = 'https://uland.taobao.com/coupon'",
            )
            .page(
                "https://uland.taobao.com/coupon",
                r#"<a href="https://h5.m.taobao.com/i.htm?itemId=">buy</a>"#,
            );
        let ctx = stub.context();
        let resolved = resolve_click(&ctx, &url("https://s.click.taobao.com/t?e=3"))
            .await
            .unwrap();
        assert_eq!(resolved.as_str(), "https://h5.m.taobao.com/i.htm?itemId=");
    }

    #[tokio::test]
    async fn transport_failure_is_not_retried() {
        let stub = StubTransport::new();
        let ctx = stub.context();
        let err = resolve_click(&ctx, &url("https://s.click.taobao.com/t?e=4"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::error::ErrorKind::Transport);
        assert_eq!(stub.request_count(), 1);
    }
}
