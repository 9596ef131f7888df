//! 模拟 LLM
//!
//! 离线模式使用的确定性模型，不需要 API Key。
//! 根据系统提示词首行的角色声明判断当前步骤。

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use crate::core::llm::{ChatModel, Message, Role};
use crate::core::prompt::{CHART_ROLE, OBSERVE_ROLE, SQL_ROLE};

pub const MOCK_MODEL_NAME: &str = "mock";

pub struct MockLlm {
    calls: AtomicUsize,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    /// 已处理的调用次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 按查询中的关键字挑选 SQL，默认查询使用者
    pub fn sql_for(query: &str) -> &'static str {
        let q = query.to_lowercase();
        if q.contains("product") || q.contains("產品") || q.contains("产品") {
            "SELECT * FROM products"
        } else if q.contains("order") || q.contains("訂單") || q.contains("订单") {
            "SELECT * FROM orders"
        } else {
            "SELECT * FROM users LIMIT 3"
        }
    }

    fn table_for(query: &str) -> &'static str {
        Self::sql_for(query)
            .split_whitespace()
            .nth(3)
            .unwrap_or("users")
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatModel for MockLlm {
    async fn chat(&self, messages: Vec<Message>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let reply = if system.starts_with(SQL_ROLE) {
            Self::sql_for(user).to_string()
        } else if system.starts_with(OBSERVE_ROLE) {
            format!("(mock) The query ran; here is what came back. {}", user)
        } else if system.starts_with(CHART_ROLE) {
            "## Chart suggestion\nBar chart\n\n## Chart code (Mermaid)\n```mermaid\npie title Mock\n```\n\n## Key insights\n(mock)".to_string()
        } else {
            format!(
                "(mock) This is a SELECT query that reads from the {} table.",
                Self::table_for(user)
            )
        };

        Ok(reply)
    }

    fn model_name(&self) -> &str {
        MOCK_MODEL_NAME
    }
}
