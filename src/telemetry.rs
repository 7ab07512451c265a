//! 日志初始化 (Tracing Bootstrap)

use tracing_subscriber::EnvFilter;

/// 安装全局 fmt 订阅器
///
/// 过滤规则取自 `RUST_LOG`，缺省为 `info`。重复调用不会报错，宿主程序已安装订阅器时保持原样。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
