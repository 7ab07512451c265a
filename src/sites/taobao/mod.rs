//! 淘宝/天猫规则表

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::core::config::MOBILE_USER_AGENT;
use crate::core::error::{ResolveError, Result};
use crate::core::model::Platform;
use crate::interfaces::PageRequest;
use crate::network::ServiceContext;
use crate::sites::{Extractor, Step};
use crate::utils::{first_id, host_ends_with_any, parse_id, parse_link, query_id, query_param};

pub mod affiliate;
mod selectors;

pub use affiliate::{ITEM_PARAMS, resolve_click};
pub use selectors::SiteSelectors;

const TAOBAO_SUFFIXES: &[&str] = &[".taobao.com", ".tmall.com", ".tb.cn", ".tmall.hk"];

pub struct Taobao;

impl Taobao {
    /// 登录页：跳转参数即真实链接
    fn login_redirect(&self, url: &Url, key: &str) -> Result<Step> {
        match query_param(url, key) {
            Some(raw) => parse_link(&raw).map(Step::Follow),
            None => Ok(Step::NotFound),
        }
    }

    /// 淘宝客链接：先读自身参数，再走跳转解析后重读
    async fn affiliate(&self, url: &Url, ctx: &ServiceContext) -> Result<Step> {
        if let Some(id) = first_id(url, ITEM_PARAMS) {
            return Ok(Step::Found(id));
        }
        let original = resolve_click(ctx, url).await?;
        debug!("淘宝客链接还原: {} -> {}", url, original);
        Ok(Step::from_id(first_id(&original, ITEM_PARAMS)))
    }

    /// 短视频分享：内嵌 query 参数本身是一段查询串
    fn duanqu(&self, url: &Url) -> Result<Step> {
        let Some(raw) = query_param(url, "query") else {
            return Ok(Step::NotFound);
        };
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(&raw).map_err(|e| ResolveError::MalformedQuery {
                link: url.to_string(),
                reason: e.to_string(),
            })?;
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .unwrap_or_default()
        };

        let promoted = !get("ews_act_type").is_empty() && get("promo_id") != "1";
        if promoted || !get("redt").is_empty() {
            return Ok(Step::from_id(parse_id(get("goodsId"))));
        }
        Ok(Step::NotFound)
    }

    /// 阿里健康网关：跟随跳转，落到天猫详情页才继续
    async fn alihealth(&self, url: &Url, ctx: &ServiceContext) -> Result<Step> {
        let page = ctx
            .fetch(PageRequest::new(url.clone()).with_user_agent(MOBILE_USER_AGENT))
            .await
            .map_err(|e| e.during("alihealth_gateway", url.as_str()))?;
        if page.url.host_str() == Some("detail.m.tmall.com") {
            return Ok(Step::Follow(page.url));
        }
        Ok(Step::NotFound)
    }
}

#[async_trait]
impl Extractor for Taobao {
    fn platform(&self) -> Platform {
        Platform::Taobao
    }

    async fn step(&self, url: &Url, ctx: &ServiceContext) -> Result<Step> {
        let host = url.host_str().unwrap_or_default();
        match host {
            "login.taobao.com" => self.login_redirect(url, "redirectURL"),
            "login.1688.com" => self.login_redirect(url, "target"),
            "s.click.taobao.com" | "uland.taobao.com" | "mo.m.tmall.com" | "mo.m.taobao.com" => {
                self.affiliate(url, ctx).await
            }
            "m.duanqu.com" => self.duanqu(url),
            "gateway.alihealth.taobao.com" => self.alihealth(url, ctx).await,
            _ => {
                if !host_ends_with_any(host, TAOBAO_SUFFIXES) {
                    return Err(ResolveError::UnsupportedHost(url.to_string()));
                }
                Ok(Step::from_id(query_id(url, "id")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::testing::StubTransport;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn item_page_needs_no_network() {
        let stub = StubTransport::new();
        let ctx = stub.context();
        let step = Taobao
            .step(&url("https://item.taobao.com/item.htm?id=98765"), &ctx)
            .await
            .unwrap();
        assert_eq!(step, Step::Found(98765));
        assert_eq!(stub.request_count(), 0);
    }

    #[tokio::test]
    async fn foreign_host_is_unsupported() {
        let ctx = StubTransport::new().context();
        let err = Taobao
            .step(&url("https://example.com/item.htm?id=1"), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn login_pages_follow_redirect_params() {
        let ctx = StubTransport::new().context();
        let tb = url("https://login.taobao.com/member/login.jhtml?redirectURL=https%3A%2F%2Fitem.taobao.com%2Fitem.htm%3Fid%3D3");
        assert_eq!(
            Taobao.step(&tb, &ctx).await.unwrap(),
            Step::Follow(url("https://item.taobao.com/item.htm?id=3"))
        );
        let ali = url("https://login.1688.com/member/signin.htm?target=https%3A%2F%2Fdetail.tmall.com%2Fitem.htm%3Fid%3D4");
        assert_eq!(
            Taobao.step(&ali, &ctx).await.unwrap(),
            Step::Follow(url("https://detail.tmall.com/item.htm?id=4"))
        );
        let bad = url("https://login.taobao.com/?redirectURL=nope");
        assert_eq!(
            Taobao.step(&bad, &ctx).await.unwrap_err().kind(),
            ErrorKind::MalformedInput
        );
    }

    #[tokio::test]
    async fn affiliate_params_read_before_network() {
        let stub = StubTransport::new();
        let ctx = stub.context();
        let u = url("https://uland.taobao.com/coupon/edetail?itemId=77&e=x");
        assert_eq!(Taobao.step(&u, &ctx).await.unwrap(), Step::Found(77));
        assert_eq!(stub.request_count(), 0);
    }

    #[tokio::test]
    async fn affiliate_falls_back_to_click_resolver() {
        let stub = StubTransport::new().page(
            "https://mo.m.tmall.com/x?e=1",
            r#"<a href="https://detail.m.tmall.com/item.htm?item_id=909">go</a>"#,
        );
        let ctx = stub.context();
        let u = url("https://mo.m.tmall.com/x?e=1");
        assert_eq!(Taobao.step(&u, &ctx).await.unwrap(), Step::Found(909));
    }

    #[tokio::test]
    async fn duanqu_nested_query_rules() {
        let ctx = StubTransport::new().context();
        let cases = [
            ("ews_act_type%3D1%26goodsId%3D12", Step::Found(12)),
            ("ews_act_type%3D1%26promo_id%3D1%26goodsId%3D12", Step::NotFound),
            ("promo_id%3D1%26redt%3Dx%26goodsId%3D13", Step::Found(13)),
            ("goodsId%3D14", Step::NotFound),
        ];
        for (query, expected) in cases {
            let u = url(&format!("https://m.duanqu.com/?query={}", query));
            assert_eq!(Taobao.step(&u, &ctx).await.unwrap(), expected, "{}", query);
        }
    }

    #[tokio::test]
    async fn alihealth_follows_tmall_detail_only() {
        let stub = StubTransport::new()
            .redirect(
                "https://gateway.alihealth.taobao.com/a",
                "https://detail.m.tmall.com/item.htm?id=5",
                "",
            )
            .redirect(
                "https://gateway.alihealth.taobao.com/b",
                "https://www.alihealth.cn/",
                "",
            );
        let ctx = stub.context();
        assert_eq!(
            Taobao
                .step(&url("https://gateway.alihealth.taobao.com/a"), &ctx)
                .await
                .unwrap(),
            Step::Follow(url("https://detail.m.tmall.com/item.htm?id=5"))
        );
        assert_eq!(
            Taobao
                .step(&url("https://gateway.alihealth.taobao.com/b"), &ctx)
                .await
                .unwrap(),
            Step::NotFound
        );
    }
}
