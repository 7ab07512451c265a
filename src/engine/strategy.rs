//! 有序提取策略 (Ordered Extraction Strategies)
//!
//! 每条策略是一个从响应体到命中结果的纯函数，按顺序应用，首个命中即返回。
//! 站点改版只需调整对应条目。

use regex::Regex;

use crate::utils::{parse_id, unescape_html};

/// 捕获组的语义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// 数字商品 ID
    ItemId,
    /// 需要继续解析的链接
    Link,
}

/// 策略命中结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hit {
    Item(u64),
    Link(String),
}

pub struct Pattern {
    pub name: &'static str,
    regex: Regex,
    capture: Capture,
    decode: fn(&str) -> String,
}

impl Pattern {
    /// 编译静态模式，模式本身有误属于编程错误
    pub fn new(name: &'static str, pattern: &str, capture: Capture) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).unwrap(),
            capture,
            decode: verbatim,
        }
    }

    pub fn decoded(mut self, decode: fn(&str) -> String) -> Self {
        self.decode = decode;
        self
    }

    /// 取首个匹配的第一个捕获组；数字 ID 无效时视为未命中
    pub fn apply(&self, body: &str) -> Option<Hit> {
        let caps = self.regex.captures(body)?;
        let raw = caps.get(1).or_else(|| caps.get(0))?.as_str();
        let value = (self.decode)(raw);
        match self.capture {
            Capture::ItemId => parse_id(&value).map(Hit::Item),
            Capture::Link => Some(Hit::Link(value)),
        }
    }
}

/// 按顺序应用策略，返回首个命中及其名称
pub fn first_hit<'a>(patterns: &'a [Pattern], body: &str) -> Option<(&'a str, Hit)> {
    patterns
        .iter()
        .find_map(|p| p.apply(body).map(|hit| (p.name, hit)))
}

pub fn verbatim(raw: &str) -> String {
    raw.to_string()
}

pub fn html_entities(raw: &str) -> String {
    unescape_html(raw).into_owned()
}

/// 还原 JS 字面量中转义的斜杠与 & 符号
pub fn js_escapes(raw: &str) -> String {
    raw.replace("\\/", "/").replace("\\u0026", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Vec<Pattern> {
        vec![
            Pattern::new("id", r"wareId=(\d+)", Capture::ItemId),
            Pattern::new("link", r#""(https://u\.jd\.com/\w+)""#, Capture::Link),
        ]
    }

    #[test]
    fn first_pattern_wins() {
        let body = r#"x "https://u.jd.com/abc" wareId=12"#;
        assert_eq!(
            first_hit(&patterns(), body),
            Some(("id", Hit::Item(12)))
        );
    }

    #[test]
    fn zero_id_falls_through_to_next_pattern() {
        let body = r#"wareId=0 "https://u.jd.com/abc""#;
        assert_eq!(
            first_hit(&patterns(), body),
            Some(("link", Hit::Link("https://u.jd.com/abc".into())))
        );
    }

    #[test]
    fn decoders_apply_to_capture() {
        let p = Pattern::new("js", r#"link:"(https.+?)""#, Capture::Link).decoded(js_escapes);
        assert_eq!(
            p.apply(r#"link:"https:\/\/a.example\/x?a=1\u0026b=2""#),
            Some(Hit::Link("https://a.example/x?a=1&b=2".into()))
        );
        assert_eq!(first_hit(&[], "anything"), None);
    }
}
