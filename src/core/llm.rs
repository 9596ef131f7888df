//! LLM 抽象
//!
//! 工作流只依赖 [`ChatModel`]，具体提供方在基础设施层实现

use anyhow::Result;
use async_trait::async_trait;

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

/// 消息结构
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// 聊天补全模型
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// 一次请求/响应往返，返回首个候选的文本
    async fn chat(&self, messages: Vec<Message>) -> Result<String>;

    /// 模型名称
    fn model_name(&self) -> &str;
}
