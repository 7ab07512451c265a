use async_trait::async_trait;
use url::Url;

use crate::core::error::Result;
use crate::core::model::Platform;
use crate::network::ServiceContext;
use crate::sites::{Extractor, Step};
use crate::utils::{query_id, query_param};

/// 美团：page_sku_id → sku_id → 内嵌 deepLinkUrl
pub struct Meituan;

#[async_trait]
impl Extractor for Meituan {
    fn platform(&self) -> Platform {
        Platform::Meituan
    }

    async fn step(&self, url: &Url, _ctx: &ServiceContext) -> Result<Step> {
        if let Some(id) = query_id(url, "page_sku_id").or_else(|| query_id(url, "sku_id")) {
            return Ok(Step::Found(id));
        }
        Ok(query_param(url, "deepLinkUrl")
            .map(Step::DeepLink)
            .unwrap_or(Step::NotFound))
    }
}
