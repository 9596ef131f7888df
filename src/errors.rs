//! 标准化错误处理
//!
//! 定义服务专用的错误类型

use thiserror::Error;

/// 服务主要错误类型
#[derive(Error, Debug)]
pub enum AgentError {
    /// 输入验证错误
    #[error("Validation error: {0}")]
    Validation(String),

    /// LLM 服务错误
    #[error("LLM service error: {0}")]
    Llm(String),

    /// 远程工具服务器错误
    #[error("Tool server error: {0}")]
    ToolServer(String),

    /// 本地数据库错误
    #[error("Database error: {0}")]
    Database(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// 是否属于调用方错误
    pub fn is_client_error(&self) -> bool {
        matches!(self, AgentError::Validation(_))
    }
}

impl From<std::io::Error> for AgentError {
    fn from(err: std::io::Error) -> Self {
        AgentError::Database(err.to_string())
    }
}

impl From<rusqlite::Error> for AgentError {
    fn from(err: rusqlite::Error) -> Self {
        AgentError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        AgentError::ToolServer(err.to_string())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::ToolServer(format!("invalid JSON payload: {}", err))
    }
}

/// 服务结果类型别名
pub type Result<T> = std::result::Result<T, AgentError>;
