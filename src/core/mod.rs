//! 核心层
//!
//! 配置、外部协作方接口（LLM 与远程工具服务器）以及 Agent 工作流

pub mod agent;
pub mod config;
pub mod llm;
pub mod observation;
pub mod prompt;
pub mod tools;

pub use agent::{AgentInfo, AgentOutcome, SqlAgent};
pub use config::{AppConfig, LlmProvider, LlmSettings};
pub use llm::{ChatModel, Message, Role};
pub use tools::DatabaseTools;
