use async_trait::async_trait;
use url::Url;

use crate::core::error::Result;
use crate::core::model::Platform;
use crate::network::ServiceContext;
use crate::sites::{Extractor, Step};
use crate::utils::query_id;

/// 拼多多：跳转已在落地页解析阶段完成，这里只读 goods_id
pub struct Pdd;

#[async_trait]
impl Extractor for Pdd {
    fn platform(&self) -> Platform {
        Platform::Pdd
    }

    async fn step(&self, url: &Url, _ctx: &ServiceContext) -> Result<Step> {
        Ok(Step::from_id(query_id(url, "goods_id")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubTransport;

    #[tokio::test]
    async fn reads_goods_id_without_network() {
        let stub = StubTransport::new();
        let ctx = stub.context();
        let url = Url::parse("https://mobile.yangkeduo.com/goods.html?goods_id=12345").unwrap();
        assert_eq!(Pdd.step(&url, &ctx).await.unwrap(), Step::Found(12345));

        let url = Url::parse("https://mobile.yangkeduo.com/goods.html").unwrap();
        assert_eq!(Pdd.step(&url, &ctx).await.unwrap(), Step::NotFound);
        assert_eq!(stub.request_count(), 0);
    }
}
