pub mod context;
pub mod middleware;
pub mod service;
pub mod session;

pub use context::ServiceContext;
pub use service::HttpService;
