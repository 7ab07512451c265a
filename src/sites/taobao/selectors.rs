//! 淘宝客页面选择器
//!
//! 预编译的 CSS 选择器

use std::sync::OnceLock;

use scraper::Selector;

/// 选择器集合
pub struct SiteSelectors {
    pub anchor: Selector,
    pub item_div: Selector,
}

static SELECTORS: OnceLock<SiteSelectors> = OnceLock::new();

impl SiteSelectors {
    /// 获取全局选择器实例
    pub fn get() -> &'static SiteSelectors {
        SELECTORS.get_or_init(|| SiteSelectors {
            anchor: Selector::parse("a[href]").unwrap(),
            item_div: Selector::parse("div[item_id]").unwrap(),
        })
    }
}
