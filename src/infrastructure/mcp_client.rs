//! MCP 数据库客户端
//!
//! 通过 HTTP 连接外部数据库工具服务器

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::core::tools::DatabaseTools;
use crate::domain::ToolInfo;
use crate::errors::{AgentError, Result};

pub struct McpDatabaseClient {
    base_url: String,
    client: reqwest::Client,
    connected: AtomicBool,
}

impl McpDatabaseClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| {
            AgentError::Config(format!("invalid MCP server URL {}: {}", base_url, e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            client,
            connected: AtomicBool::new(false),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// 通过健康检查确认连接
    pub async fn connect(&self) -> Result<()> {
        let health = self.get("/health").await;
        match health {
            Ok(body) if body.get("status").and_then(Value::as_str) == Some("healthy") => {
                self.connected.store(true, Ordering::SeqCst);
                info!(url = %self.base_url, "connected to MCP database server");
                Ok(())
            }
            Ok(body) => {
                self.connected.store(false, Ordering::SeqCst);
                Err(AgentError::ToolServer(format!(
                    "health check failed: {}",
                    body
                )))
            }
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                warn!(url = %self.base_url, error = %e, "MCP server connection failed");
                Err(e)
            }
        }
    }

    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            info!(url = %self.base_url, "disconnected from MCP database server");
        }
    }

    /// 未连接时先连接
    pub async fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        self.connect().await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/api/table/{name}[/sample]`，表名作为单个路径段编码
    fn table_url(&self, table_name: &str, sample: bool) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| AgentError::Config(format!("invalid MCP server URL: {}", e)))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AgentError::Config(format!("MCP server URL cannot be a base: {}", self.base_url))
            })?;
            segments.pop_if_empty().extend(["api", "table", table_name]);
            if sample {
                segments.push("sample");
            }
        }
        Ok(url)
    }

    async fn get(&self, path: &str) -> Result<Value> {
        debug!(path, "GET MCP server");
        self.send(self.client.get(self.url(path))).await
    }

    async fn post(&self, path: &str, payload: &Value) -> Result<Value> {
        debug!(path, "POST MCP server");
        self.send(self.client.post(self.url(path)).json(payload)).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        Self::read_body(response).await
    }

    /// 非 2xx 或带 `error` 字段的响应都视为远端失败
    async fn read_body(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await?;
        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if let Some(message) = remote_error(&body) {
            return Err(AgentError::ToolServer(message));
        }
        if !status.is_success() {
            return Err(AgentError::ToolServer(format!(
                "server responded with {}: {}",
                status, body
            )));
        }
        Ok(body)
    }
}

fn remote_error(body: &Value) -> Option<String> {
    let field = body.get("error").or_else(|| body.get("detail"))?;
    match field {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => Some(
            obj.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| field.to_string()),
        ),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl DatabaseTools for McpDatabaseClient {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn health_check(&self) -> Result<Value> {
        self.get("/health").await
    }

    async fn list_tools(&self) -> Result<Vec<ToolInfo>> {
        let body = self.get("/api/tools").await?;
        let tools = body.get("tools").cloned().unwrap_or_else(|| json!([]));
        Ok(serde_json::from_value(tools)?)
    }

    async fn get_schema(&self) -> Result<Value> {
        self.ensure_connected().await?;
        self.get("/api/schema").await
    }

    async fn execute_query(&self, sql: &str) -> Result<Value> {
        self.ensure_connected().await?;
        self.post("/api/query", &json!({ "sql": sql })).await
    }

    async fn get_table_info(&self, table_name: &str) -> Result<Value> {
        self.ensure_connected().await?;
        let url = self.table_url(table_name, false)?;
        debug!(%url, "GET MCP server");
        self.send(self.client.get(url)).await
    }

    async fn get_sample_data(&self, table_name: &str, limit: u64) -> Result<Value> {
        self.ensure_connected().await?;
        let url = self.table_url(table_name, true)?;
        debug!(%url, limit, "GET MCP server");
        self.send(self.client.get(url).query(&[("limit", limit)])).await
    }
}
