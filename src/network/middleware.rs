use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use tracing::debug;

use crate::network::session::RequestProfile;

/// 请求画像注入中间件
/// 负责在请求发出前，将 RequestProfile 中的 UA/Referer 写入 Header
pub struct ProfileMiddleware;

#[async_trait::async_trait]
impl Middleware for ProfileMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        if let Some(profile) = extensions.get::<RequestProfile>()
            && !profile.is_empty()
        {
            profile.apply(req.headers_mut());
        }

        debug!("GET {}", req.url());
        let resp = next.run(req, extensions).await?;
        debug!("{} <- {}", resp.status(), resp.url());
        Ok(resp)
    }
}
