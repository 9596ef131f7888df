//! SQL Agent 后端
//!
//! 单一 HTTP 服务：把自然语言查询交给 LLM 驱动的工作流，
//! 生成 SQL 并通过远程工具服务器执行，最后返回自然语言回答与原始结果。
//!
//! # 架构分层
//!
//! - `domain`: 请求、响应与数据库结构等数据形状
//! - `core`: 配置、协作方接口、提示词与 Agent 工作流
//! - `infrastructure`: LLM 客户端、远程工具客户端、本地示例库、日志与 Web 服务
//! - `bootstrap`: 按配置装配并启动服务

pub mod bootstrap;
pub mod core;
pub mod domain;
pub mod errors;
pub mod infrastructure;

pub use crate::core::agent::{AgentOutcome, SqlAgent};
pub use crate::core::config::{AppConfig, LlmProvider};
pub use crate::core::llm::{ChatModel, Message};
pub use crate::core::tools::DatabaseTools;
pub use domain::{QueryRequest, QueryResponse};
pub use errors::{AgentError, Result};
pub use infrastructure::llm::OpenAIClient;
pub use infrastructure::mcp_client::McpDatabaseClient;
pub use infrastructure::mock_llm::MockLlm;
pub use infrastructure::sample_db::SampleDatabase;
pub use infrastructure::web::{create_router, start_web_server, AppState};

/// 服务版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
