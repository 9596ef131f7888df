//! 查询请求与响应
//!
//! `/execute-agent` 的输入输出结构

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{AgentError, Result};

/// 查询请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// 自然语言查询
    pub query: String,
    /// 额外上下文
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            context: Map::new(),
        }
    }

    /// 设置上下文字段
    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// 校验查询内容，返回去除首尾空白后的查询
    pub fn validated_query(&self) -> Result<&str> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err(AgentError::Validation("query must not be empty".to_string()));
        }
        Ok(query)
    }
}

/// 查询响应
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    /// 自然语言回答
    pub response: String,
    /// 生成的 SQL
    #[serde(default)]
    pub sql_generated: String,
    /// 远程执行的原始结果
    #[serde(default)]
    pub data: Map<String, Value>,
    /// 推理阶段的意图分析
    #[serde(default)]
    pub reasoning: String,
    /// 图表建议（未启用时为空）
    #[serde(default)]
    pub chart_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_context_defaults_to_empty() {
        let req: QueryRequest = serde_json::from_value(json!({"query": "list users"})).unwrap();
        assert_eq!(req.query, "list users");
        assert!(req.context.is_empty());
    }

    #[test]
    fn test_request_missing_query_is_rejected() {
        let result: std::result::Result<QueryRequest, _> =
            serde_json::from_value(json!({"context": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_query_fails_validation() {
        let req = QueryRequest::new("   \n");
        assert!(matches!(req.validated_query(), Err(AgentError::Validation(_))));

        let req = QueryRequest::new("  show orders ");
        assert_eq!(req.validated_query().unwrap(), "show orders");
    }

    #[test]
    fn test_response_always_serializes_declared_fields() {
        let value = serde_json::to_value(QueryResponse::default()).unwrap();
        assert!(value.get("response").is_some());
        assert_eq!(value["sql_generated"], "");
        assert_eq!(value["data"], json!({}));
    }
}
