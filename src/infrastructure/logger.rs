//! 日志模块
//!
//! 基于 tracing-subscriber 的日志初始化，`RUST_LOG` 优先于配置的级别

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 构建过滤器
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化日志系统，重复调用时忽略
pub fn init(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init("debug");
        init("info");
        tracing::info!("logger initialised");
    }

    #[test]
    fn test_invalid_level_falls_back() {
        // 非法指令不应 panic
        let _ = env_filter("not a [valid filter");
    }
}
