//! 日志初始化
//!
//! 默认级别为 `info`，开启详细日志时为 `debug`，`RUST_LOG` 优先

use tracing_subscriber::EnvFilter;

/// 初始化全局 tracing subscriber
///
/// 重复调用是安全的（测试中常见），第二次起直接忽略
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
