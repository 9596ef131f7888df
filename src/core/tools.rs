//! 远程数据库工具接口
//!
//! 对外部工具调用服务器的抽象，SQL 始终在远端执行

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ToolInfo;
use crate::errors::{AgentError, Result};

pub const TOOL_GET_DATABASE_SCHEMA: &str = "get_database_schema";
pub const TOOL_EXECUTE_QUERY: &str = "execute_query";
pub const TOOL_GET_TABLE_INFO: &str = "get_table_info";
pub const TOOL_GET_SAMPLE_DATA: &str = "get_sample_data";

/// 取样默认行数
pub const DEFAULT_SAMPLE_LIMIT: u64 = 5;

#[async_trait]
pub trait DatabaseTools: Send + Sync {
    /// 远端基础地址
    fn endpoint(&self) -> &str;

    async fn health_check(&self) -> Result<Value>;

    async fn list_tools(&self) -> Result<Vec<ToolInfo>>;

    async fn get_schema(&self) -> Result<Value>;

    async fn execute_query(&self, sql: &str) -> Result<Value>;

    async fn get_table_info(&self, table_name: &str) -> Result<Value>;

    async fn get_sample_data(&self, table_name: &str, limit: u64) -> Result<Value>;

    /// 按工具名分发调用
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        let str_arg = |key: &str| {
            arguments
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        match name {
            TOOL_GET_DATABASE_SCHEMA => self.get_schema().await,
            TOOL_EXECUTE_QUERY => self.execute_query(&str_arg("sql")).await,
            TOOL_GET_TABLE_INFO => self.get_table_info(&str_arg("table_name")).await,
            TOOL_GET_SAMPLE_DATA => {
                let limit = arguments
                    .get("limit")
                    .and_then(Value::as_u64)
                    .unwrap_or(DEFAULT_SAMPLE_LIMIT);
                self.get_sample_data(&str_arg("table_name"), limit).await
            }
            other => Err(AgentError::ToolServer(format!("unknown tool: {}", other))),
        }
    }
}
