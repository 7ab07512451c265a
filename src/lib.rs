//! 电商链接解析 (E-commerce Link Resolution)
//!
//! 将营销短链、淘宝客链接与 App 直达链接还原为 `(商品 ID, 平台)`。
//!
//! ```no_run
//! use ecom_link::{Resolver, ResolverConfig};
//!
//! # async fn run() -> ecom_link::Result<()> {
//! let resolver = Resolver::from_config(ResolverConfig::load()?)?;
//! let item = resolver.resolve_item("https://item.jd.com/100012043978.html").await?;
//! println!("{} {}", item.platform(), item.item_id());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod core;
pub mod engine;
pub mod interfaces;
pub mod network;
pub mod sites;
pub mod telemetry;
pub mod utils;

#[cfg(test)]
mod testing;

pub use crate::cache::MemoryCache;
pub use crate::core::config::{FirstPartyConfig, HttpConfig, ResolverConfig};
pub use crate::core::error::{ErrorKind, ResolveError, Result};
pub use crate::core::model::{AffiliateLink, ItemRef, Platform};
pub use crate::engine::Resolver;
pub use crate::interfaces::{LinkCache, Page, PageRequest, Transport};
pub use crate::network::{HttpService, ServiceContext};
