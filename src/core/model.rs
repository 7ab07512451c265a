use serde::Serialize;
use url::Url;

/// 电商平台标识
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Unknown,
    Taobao,
    Jd,
    Pdd,
    WeChat,
    Meituan,
}

/// 商品引用
///
/// 商品 ID 恒为非零值，0 只作为 "未找到" 的内部哨兵，不会出现在这里。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ItemRef {
    item_id: u64,
    platform: Platform,
}

impl ItemRef {
    pub fn new(item_id: u64, platform: Platform) -> Option<Self> {
        (item_id > 0).then_some(Self { item_id, platform })
    }

    pub fn item_id(&self) -> u64 {
        self.item_id
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}

/// 淘宝客链接解析结果
#[derive(Debug, Clone)]
pub struct AffiliateLink {
    /// 规范化后的 s.click.taobao.com 链接
    pub affiliate_url: String,
    /// 跳转后的原始商品链接
    pub original_url: Url,
    /// ali_trackid 三元组的中间字段
    pub sub_tracking_id: String,
}
