pub mod cache;
pub mod transport;

pub use cache::{LinkCache, cache_key};
pub use transport::{Page, PageRequest, Transport};
