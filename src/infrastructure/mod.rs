//! 基础设施层：外部系统交互
//!
//! 提供与外部系统（LLM、远程工具服务器、本地 SQLite、日志、HTTP）的交互能力

pub mod llm;
pub mod logger;
pub mod mcp_client;
pub mod mock_llm;
pub mod sample_db;
pub mod web;
