//! 测试通用工具
//!
//! 提供测试辅助函数和通用测试工具

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Once;
use std::time::Duration;

use axum::Router;

static INIT: Once = Once::new();

/// 初始化测试环境
pub fn setup() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// 在随机端口上启动路由，返回监听地址
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // 等待服务器启动
    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

/// 测试超时包装器
pub async fn with_timeout<F, T>(duration: Duration, f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(duration, f)
        .await
        .expect("Test timed out")
}

pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// 无人监听的地址
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";
