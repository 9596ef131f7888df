use anyhow::Result;
use clap::Parser;
use tracing::info;

use sql_agent_backend::bootstrap::ServiceLauncher;
use sql_agent_backend::infrastructure::logger;
use sql_agent_backend::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // 缺少 .env 文件时直接使用进程环境
    dotenv::dotenv().ok();

    let cfg = AppConfig::parse();
    logger::init(cfg.effective_log_level());

    info!(
        version = sql_agent_backend::VERSION,
        bind = %cfg.bind_addr(),
        "starting SQL agent backend"
    );

    ServiceLauncher::new(cfg).launch().await
}
