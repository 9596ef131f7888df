//! SQL Agent
//!
//! reason → action → observe（→ visualize）的顺序工作流：
//! - reason: 分析自然语言查询意图
//! - action: 生成 SQL 并交给远程工具服务器执行
//! - observe: 解读执行结果并生成自然语言回答
//! - visualize: 可选，多行数值结果时给出图表建议

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use crate::core::llm::{ChatModel, Message};
use crate::core::observation::{
    error_result, format_execution_result, prepare_chart_data, should_generate_chart,
};
use crate::core::prompt::{
    chart_prompt, extract_sql, observe_prompt, reason_prompt, render_schema, sql_prompt,
};
use crate::core::tools::DatabaseTools;
use crate::errors::{AgentError, Result};
use crate::infrastructure::sample_db::SampleDatabase;

pub const AGENT_NAME: &str = "SQL Agent";
pub const NO_CHART_NEEDED: &str = "No chart needed";

/// 工作流状态，各步骤依次填充
#[derive(Debug, Clone, Default)]
struct AgentState {
    query: String,
    context: Map<String, Value>,
    /// 每次运行只加载一次，reason 与 action 共用
    schema: String,
    reasoning: String,
    sql_query: String,
    execution_result: Value,
    response: String,
    chart_description: String,
}

impl AgentState {
    fn new(query: &str, context: Map<String, Value>) -> Self {
        Self {
            query: query.to_string(),
            context,
            ..Default::default()
        }
    }

    fn into_outcome(self) -> AgentOutcome {
        AgentOutcome {
            response: self.response,
            sql_generated: self.sql_query,
            data: self.execution_result,
            reasoning: self.reasoning,
            chart_description: self.chart_description,
        }
    }
}

/// 一次执行的结果
#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    pub response: String,
    pub sql_generated: String,
    pub data: Value,
    pub reasoning: String,
    pub chart_description: String,
}

/// Agent 描述信息
#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
    pub model: String,
    pub capabilities: Vec<String>,
    pub workflow: Vec<String>,
    pub supported_queries: Vec<String>,
}

pub struct SqlAgent {
    llm: Arc<dyn ChatModel>,
    tools: Arc<dyn DatabaseTools>,
    local_db: Option<Arc<SampleDatabase>>,
    charts_enabled: bool,
}

impl SqlAgent {
    pub fn new(llm: Arc<dyn ChatModel>, tools: Arc<dyn DatabaseTools>) -> Self {
        Self {
            llm,
            tools,
            local_db: None,
            charts_enabled: false,
        }
    }

    /// 远程结构不可用时回退到本地示例库的结构
    pub fn with_local_schema(mut self, db: Arc<SampleDatabase>) -> Self {
        self.local_db = Some(db);
        self
    }

    pub fn with_charts(mut self, enabled: bool) -> Self {
        self.charts_enabled = enabled;
        self
    }

    pub fn charts_enabled(&self) -> bool {
        self.charts_enabled
    }

    /// 执行完整工作流
    pub async fn execute(&self, query: &str, context: Map<String, Value>) -> Result<AgentOutcome> {
        let mut state = AgentState::new(query, context);
        info!(query = %state.query, "agent run started");

        state.schema = self.schema_text().await;
        self.reason(&mut state).await?;
        self.action(&mut state).await?;
        self.observe(&mut state).await?;
        if self.charts_enabled {
            self.visualize(&mut state).await?;
        }

        info!(sql = %state.sql_query, "agent run completed");
        Ok(state.into_outcome())
    }

    async fn reason(&self, state: &mut AgentState) -> Result<()> {
        let prompt = reason_prompt(&state.query, &state.schema, &state.context);

        state.reasoning = self
            .ask(vec![Message::system(prompt), Message::user(&state.query)], "reason")
            .await?;
        debug!(reasoning = %state.reasoning, "reason step finished");
        Ok(())
    }

    async fn action(&self, state: &mut AgentState) -> Result<()> {
        let prompt = sql_prompt(&state.query, &state.schema, &state.reasoning);

        let raw = self
            .ask(vec![Message::system(prompt), Message::user(&state.query)], "action")
            .await?;
        state.sql_query = extract_sql(&raw);
        debug!(sql = %state.sql_query, "generated SQL");

        state.execution_result = match self.tools.execute_query(&state.sql_query).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, sql = %state.sql_query, "remote query execution failed");
                error_result(&e, &state.sql_query)
            }
        };
        Ok(())
    }

    async fn observe(&self, state: &mut AgentState) -> Result<()> {
        let formatted = format_execution_result(&state.execution_result);
        let prompt = observe_prompt(&state.query, &state.reasoning, &state.sql_query, &formatted);

        state.response = self
            .ask(
                vec![Message::system(prompt), Message::user(format!("Query result: {}", formatted))],
                "observe",
            )
            .await?;
        Ok(())
    }

    async fn visualize(&self, state: &mut AgentState) -> Result<()> {
        if !should_generate_chart(&state.execution_result) {
            state.chart_description = NO_CHART_NEEDED.to_string();
            return Ok(());
        }

        let chart_data = prepare_chart_data(&state.execution_result);
        let prompt = chart_prompt(&state.query, &chart_data);
        state.chart_description = self
            .ask(
                vec![
                    Message::system(prompt),
                    Message::user(format!("Generate a chart for this data: {}", chart_data)),
                ],
                "visualize",
            )
            .await?;
        Ok(())
    }

    async fn ask(&self, messages: Vec<Message>, step: &str) -> Result<String> {
        self.llm.chat(messages).await.map_err(|e| {
            error!(step, error = %e, "LLM call failed");
            AgentError::Llm(format!("{} step: {:#}", step, e))
        })
    }

    /// 远程结构优先，失败时回退本地，最后退化为错误说明文本
    async fn schema_text(&self) -> String {
        let remote_err = match self.tools.get_schema().await {
            Ok(schema) => return render_schema(&schema),
            Err(e) => e,
        };
        warn!(error = %remote_err, "remote schema unavailable");

        if let Some(db) = &self.local_db {
            match db.schema_description().await {
                Ok(text) => return text,
                Err(e) => warn!(error = %e, "local schema unavailable"),
            }
        }

        format!("Unable to load database schema: {}", remote_err)
    }

    /// Agent 描述
    pub fn describe(&self) -> AgentInfo {
        let mut workflow = vec![
            "reason: analyse the intent of the user's query".to_string(),
            "action: generate SQL and execute it on the remote tool server".to_string(),
            "observe: interpret the result and format the answer".to_string(),
        ];
        let mut capabilities = vec![
            "natural-language understanding".to_string(),
            "SQL generation".to_string(),
            "database querying".to_string(),
            "result formatting".to_string(),
        ];
        if self.charts_enabled {
            workflow.push("visualize: suggest a chart for multi-row numeric results".to_string());
            capabilities.push("chart suggestions".to_string());
        }

        AgentInfo {
            name: AGENT_NAME.to_string(),
            description: "AI agent with reason, action and observe steps that turns natural-language questions into SQL".to_string(),
            model: self.llm.model_name().to_string(),
            capabilities,
            workflow,
            supported_queries: vec![
                "list all users".to_string(),
                "show all products".to_string(),
                "query orders".to_string(),
                "aggregations across users, products and orders".to_string(),
            ],
        }
    }

    /// 本地库信息与远程结构
    pub async fn database_info(&self) -> Result<Value> {
        let mut info = Map::new();
        info.insert("mcp_server_url".to_string(), json!(self.tools.endpoint()));

        if let Some(db) = &self.local_db {
            let local = db.database_info().await?;
            info.insert("local".to_string(), serde_json::to_value(local)?);
        }

        match self.tools.get_schema().await {
            Ok(schema) => {
                info.insert("schema".to_string(), schema);
            }
            Err(e) => {
                info.insert("error".to_string(), json!(e.to_string()));
            }
        }

        Ok(Value::Object(info))
    }
}
