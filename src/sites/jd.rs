//! 京东规则表
//!
//! 活动页、联盟短链与商品页分别处理；抓取到的协议相对链接统一补全为 https。

use std::sync::OnceLock;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::core::config::MOBILE_USER_AGENT;
use crate::core::error::Result;
use crate::core::model::Platform;
use crate::engine::strategy::{Capture, Hit, Pattern, first_hit};
use crate::interfaces::PageRequest;
use crate::network::ServiceContext;
use crate::sites::{Extractor, Step};
use crate::utils::{host_ends_with_any, query_id, query_param, to_absolute_url};

const JD_SUFFIXES: &[&str] = &[".jd.com", ".jd.hk", ".yiyaojd.com"];

/// 页面中常见的商品页地址，按优先级排列
fn item_patterns() -> Vec<Pattern> {
    vec![
        Pattern::new(
            "ware_view",
            r"//item\.m\.jd\.com/ware/view\.action\?wareId=(\d+)",
            Capture::ItemId,
        ),
        Pattern::new("m_product", r"//item\.m\.jd\.com/product/(\d+)\.html", Capture::ItemId),
        Pattern::new("pc_item", r"//item\.jd\.com/(\d+)\.html", Capture::ItemId),
        Pattern::new("yiyao_item", r"//item\.yiyaojd\.com/(\d+)\.html", Capture::ItemId),
    ]
}

struct JdPatterns {
    /// pro.m.jd.com 活动页：商品地址，最后回退到页内联盟短链
    pro_page: Vec<Pattern>,
    /// 联盟短链落到 pro.m.jd.com 时只认商品地址
    pro_landing: Vec<Pattern>,
    /// 联盟短链落到其他页面时，提取需继续解析的链接
    union_page: Vec<Pattern>,
}

static PATTERNS: OnceLock<JdPatterns> = OnceLock::new();

impl JdPatterns {
    fn get() -> &'static JdPatterns {
        PATTERNS.get_or_init(|| {
            let mut pro_page = item_patterns();
            pro_page.push(Pattern::new(
                "union_short",
                r#""(https://u\.jd\.com/\w+)""#,
                Capture::Link,
            ));
            JdPatterns {
                pro_page,
                pro_landing: item_patterns(),
                union_page: vec![
                    Pattern::new("union_jda", r"'(https://u\.jd\.com/jda\?.+?)'", Capture::Link),
                    Pattern::new("pc_item", r"(//item\.jd\.com/\d+\.html)", Capture::Link),
                    Pattern::new(
                        "ware_view",
                        r"(//item\.m\.jd\.com/ware/view\.action\?wareId=\d+)",
                        Capture::Link,
                    ),
                    Pattern::new("m_product", r"(//item\.m\.jd\.com/product/\d+\.html)", Capture::Link),
                ],
            }
        })
    }
}

pub struct Jd;

impl Jd {
    /// 活动页：抓取后按序匹配
    async fn pro_page(&self, url: &Url, ctx: &ServiceContext) -> Result<Step> {
        let page = ctx
            .fetch(PageRequest::new(url.clone()).with_user_agent(MOBILE_USER_AGENT))
            .await
            .map_err(|e| e.during("jd_pro_page", url.as_str()))?;

        Ok(match first_hit(&JdPatterns::get().pro_page, &page.body) {
            Some((name, Hit::Item(id))) => {
                debug!("京东活动页命中 {}: {}", name, id);
                Step::Found(id)
            }
            Some((_, Hit::Link(link))) => Step::follow(&to_absolute_url(&page.url, &link)),
            None => Step::NotFound,
        })
    }

    /// 联盟短链：请求后按最终落地页分流
    async fn union_click(&self, url: &Url, ctx: &ServiceContext) -> Result<Step> {
        let mut target = url.clone();
        if target.path() == "/jdc" {
            target.set_path("/jda");
        }
        if let Some(id) = query_id(&target, "wareId") {
            return Ok(Step::Found(id));
        }

        let page = ctx
            .fetch(PageRequest::new(target.clone()).with_user_agent(MOBILE_USER_AGENT))
            .await
            .map_err(|e| e.during("jd_union_click", target.as_str()))?;
        let landed = &page.url;
        let host = landed.host_str().unwrap_or_default();
        debug!("京东联盟链接落地: {}", landed);

        if host == "trade.m.jd.com"
            && let Some(referer) = query_param(landed, "referer")
        {
            return Ok(Step::follow(&referer));
        }
        if host == "item.m.jd.com" {
            return Ok(Step::Follow(landed.clone()));
        }
        if host == "pro.m.jd.com" {
            return Ok(match first_hit(&JdPatterns::get().pro_landing, &page.body) {
                Some((_, Hit::Item(id))) => Step::Found(id),
                _ => Step::NotFound,
            });
        }
        if let Some(return_url) = query_param(landed, "returnurl") {
            return Ok(Step::follow(&return_url));
        }

        // 逐条尝试，首个能解析为链接的命中生效
        let next = JdPatterns::get()
            .union_page
            .iter()
            .filter_map(|p| match p.apply(&page.body) {
                Some(Hit::Link(link)) => Url::parse(&to_absolute_url(landed, &link)).ok(),
                _ => None,
            })
            .next();
        Ok(next.map(Step::Follow).unwrap_or(Step::NotFound))
    }

    /// 商品页及其他京东域名
    fn default_rule(&self, url: &Url) -> Step {
        let host = url.host_str().unwrap_or_default();
        if !host_ends_with_any(host, JD_SUFFIXES) {
            return Step::NotFound;
        }

        static HTML_ID: OnceLock<regex::Regex> = OnceLock::new();
        let re = HTML_ID.get_or_init(|| regex::Regex::new(r"(\d+)\.html").unwrap());
        if let Some(caps) = re.captures(url.path()) {
            return Step::from_id(caps[1].parse().ok());
        }
        if let Some(id) = query_id(url, "wareId") {
            return Step::Found(id);
        }
        query_param(url, "to")
            .map(|to| Step::follow(&to))
            .unwrap_or(Step::NotFound)
    }
}

#[async_trait]
impl Extractor for Jd {
    fn platform(&self) -> Platform {
        Platform::Jd
    }

    async fn step(&self, url: &Url, ctx: &ServiceContext) -> Result<Step> {
        match url.host_str().unwrap_or_default() {
            "jkgj-isv.isvjcloud.com" => {
                if let Some(inner) = query_param(url, "url") {
                    Ok(Step::follow(&inner))
                } else if url.path() == "/ad/user/activity" {
                    Ok(Step::from_id(query_id(url, "item_id")))
                } else {
                    Ok(Step::NotFound)
                }
            }
            "platform.m.jd.com" => Ok(query_param(url, "spreadUrl")
                .map(|s| Step::follow(&s))
                .unwrap_or(Step::NotFound)),
            "pro.m.jd.com" => self.pro_page(url, ctx).await,
            "u.jd.com" | "union-click.jd.com" => self.union_click(url, ctx).await,
            _ => Ok(self.default_rule(url)),
        }
    }
}
