//! 平台识别 (Platform Classifier)
//!
//! 按域名后缀映射平台，纯函数，不访问网络。

use url::Url;

use crate::core::model::Platform;

const PLATFORM_SUFFIXES: &[(&str, Platform)] = &[
    (".taobao.com", Platform::Taobao),
    (".tmall.com", Platform::Taobao),
    (".tmall.hk", Platform::Taobao),
    (".jd.com", Platform::Jd),
    (".jd.hk", Platform::Jd),
    (".yiyaojd.com", Platform::Jd),
    (".tb.cn", Platform::Taobao),
    (".pinduoduo.com", Platform::Pdd),
    (".yangkeduo.com", Platform::Pdd),
    (".duanqu.com", Platform::Taobao),
    (".1688.com", Platform::Taobao),
    (".meituan.com", Platform::Meituan),
];

pub fn classify_host(host: &str) -> Platform {
    PLATFORM_SUFFIXES
        .iter()
        .find(|(suffix, _)| host.ends_with(suffix))
        .map(|(_, platform)| *platform)
        .unwrap_or_default()
}

pub fn classify(url: &Url) -> Platform {
    url.host_str().map(classify_host).unwrap_or_default()
}

pub fn is_platform_host(host: &str) -> bool {
    classify_host(host) != Platform::Unknown
}
