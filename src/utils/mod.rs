use std::borrow::Cow;

use url::Url;

use crate::core::error::{ResolveError, Result};

/// 解析绝对链接
pub fn parse_link(link: &str) -> Result<Url> {
    Url::parse(link).map_err(|source| ResolveError::InvalidLink {
        link: link.to_string(),
        source,
    })
}

pub fn to_absolute_url(base: &Url, href: &str) -> String {
    if href.is_empty() {
        return String::new();
    }

    if let Some(path_without_slashes) = href.strip_prefix("//") {
        return format!("{}://{}", base.scheme(), path_without_slashes);
    }

    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// 读取首个同名查询参数，空值视为缺失
pub fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

pub fn has_param(url: &Url, key: &str) -> bool {
    url.query_pairs().any(|(k, _)| k == key)
}

/// 读取数值型商品 ID，0 与非数字均视为缺失
pub fn query_id(url: &Url, key: &str) -> Option<u64> {
    query_param(url, key).and_then(|v| parse_id(&v))
}

/// 按顺序尝试多个参数名
pub fn first_id(url: &Url, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|k| query_id(url, k))
}

pub fn parse_id(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().filter(|id| *id > 0)
}

pub fn unescape_html(raw: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(raw)
}

/// 路径规范化：合并重复斜杠、消解 `.` 与 `..`、去除末尾斜杠
pub fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    format!("/{}", parts.join("/"))
}

pub fn host_ends_with_any(host: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|s| host.ends_with(s))
}
