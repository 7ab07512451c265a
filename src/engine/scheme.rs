//! 直达链接解码 (App-Scheme Decoder)
//!
//! 按 scheme 分发，将 App 直达链接还原为内嵌的 H5 页面或直接得到商品 ID。
//! 纯同步逻辑，不访问网络。

use serde::Deserialize;
use url::Url;

use crate::core::error::{ResolveError, Result};
use crate::core::model::{ItemRef, Platform};
use crate::utils::{query_id, query_param};

/// 解码结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// 内嵌的平台 H5 页面，需交给对应平台的提取器继续解析
    Page { platform: Platform, url: Url },
    /// 直接得到商品
    Item(ItemRef),
}

#[derive(Deserialize)]
struct JdParams {
    #[serde(default)]
    url: String,
}

pub fn decode(url: &Url) -> Result<Decoded> {
    let scheme = url.scheme().to_ascii_lowercase();
    match scheme.as_str() {
        "tbopen" | "taobao" => {
            let page = embedded(url, &scheme, "h5Url")?;
            Ok(Decoded::Page {
                platform: Platform::Taobao,
                url: page,
            })
        }
        "openjd" | "openapp.jdmobile" => {
            let params = query_param(url, "params")
                .ok_or_else(|| malformed(&scheme, "缺少 params 参数"))?;
            let decoded: JdParams = serde_json::from_str(&params)
                .map_err(|e| malformed(&scheme, format!("params 不是合法 JSON: {}", e)))?;
            if decoded.url.is_empty() {
                return Err(malformed(&scheme, "params 缺少 url 字段"));
            }
            let page = Url::parse(&decoded.url)
                .map_err(|e| malformed(&scheme, format!("解析京东链接失败: {}", e)))?;
            Ok(Decoded::Page {
                platform: Platform::Jd,
                url: page,
            })
        }
        "pddopen" | "pinduoduo" => {
            let page = embedded(url, &scheme, "h5Url")?;
            item(query_id(&page, "goods_id"), Platform::Pdd, url)
        }
        "imeituan" => {
            let sub_link = query_param(url, "targetPath").or_else(|| query_param(url, "url"));
            let Some(sub_link) = sub_link else {
                return Err(ResolveError::ItemNotFound(url.to_string()));
            };
            let page = Url::parse(&sub_link)
                .map_err(|e| malformed(&scheme, format!("解析美团链接失败: {}", e)))?;
            item(query_id(&page, "sku_id"), Platform::Meituan, url)
        }
        _ => Err(ResolveError::UnsupportedScheme(url.to_string())),
    }
}

/// 解析字符串形式的直达链接
pub fn decode_str(link: &str) -> Result<Decoded> {
    let url = crate::utils::parse_link(link)?;
    decode(&url)
}

fn embedded(url: &Url, scheme: &str, key: &str) -> Result<Url> {
    let raw = query_param(url, key)
        .ok_or_else(|| malformed(scheme, format!("缺少 {} 参数", key)))?;
    Url::parse(&raw).map_err(|e| malformed(scheme, format!("{} 不是合法链接: {}", key, e)))
}

fn item(id: Option<u64>, platform: Platform, url: &Url) -> Result<Decoded> {
    id.and_then(|id| ItemRef::new(id, platform))
        .map(Decoded::Item)
        .ok_or_else(|| ResolveError::ItemNotFound(url.to_string()))
}

fn malformed(scheme: &str, reason: impl Into<String>) -> ResolveError {
    ResolveError::MalformedDeepLink {
        scheme: scheme.to_string(),
        reason: reason.into(),
    }
}
