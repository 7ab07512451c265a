use std::time::Duration;

use async_trait::async_trait;

use crate::core::error::Result;

/// 链接缓存接口
///
/// 语义为幂等覆盖，并发写入同一键时以最后写入者为准。
#[async_trait]
pub trait LinkCache: Send + Sync {
    /// 未命中与已过期均返回 `Ok(None)`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}

/// 落地页缓存键
pub fn cache_key(link: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"external_url:");
    hasher.update(link.as_bytes());
    hasher.finalize().to_hex().to_string()
}
