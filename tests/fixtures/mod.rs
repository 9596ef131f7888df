//! 测试 Fixtures
//!
//! 进程内的模拟工具服务器、失败的 LLM，以及按需装配的后端服务

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use sql_agent_backend::{
    create_router, AppState, ChatModel, McpDatabaseClient, Message, MockLlm, SampleDatabase,
    SqlAgent,
};

use crate::common;

/// 模拟工具服务器的行为开关与请求记录
#[derive(Default)]
pub struct MockToolState {
    pub fail_queries: AtomicBool,
    pub fail_schema: AtomicBool,
    pub unhealthy: AtomicBool,
    pub received_sql: Mutex<Vec<String>>,
    pub sample_limits: Mutex<Vec<u64>>,
}

pub struct MockToolServer {
    pub addr: SocketAddr,
    pub state: Arc<MockToolState>,
}

impl MockToolServer {
    pub async fn start() -> Self {
        Self::start_with(MockToolState::default()).await
    }

    pub async fn start_with(state: MockToolState) -> Self {
        let state = Arc::new(state);
        let app = Router::new()
            .route("/health", get(health))
            .route("/api/tools", get(tools))
            .route("/api/schema", get(schema))
            .route("/api/query", post(query))
            .route("/api/table/{name}", get(table_info))
            .route("/api/table/{name}/sample", get(sample))
            .with_state(state.clone());

        let addr = common::serve(app).await;
        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> McpDatabaseClient {
        McpDatabaseClient::new(self.url(), Duration::from_secs(5)).unwrap()
    }

    pub fn received_sql(&self) -> Vec<String> {
        self.state.received_sql.lock().unwrap().clone()
    }

    pub fn sample_limits(&self) -> Vec<u64> {
        self.state.sample_limits.lock().unwrap().clone()
    }
}

pub fn user_rows() -> Value {
    json!([
        {"id": 1, "name": "張小明", "email": "zhang@example.com", "age": 25},
        {"id": 2, "name": "李小華", "email": "li@example.com", "age": 30},
        {"id": 3, "name": "王小美", "email": "wang@example.com", "age": 28}
    ])
}

async fn health(State(state): State<Arc<MockToolState>>) -> impl IntoResponse {
    let status = if state.unhealthy.load(Ordering::SeqCst) {
        "degraded"
    } else {
        "healthy"
    };
    Json(json!({ "status": status, "database": "data/ai_agent.db" }))
}

async fn tools() -> impl IntoResponse {
    Json(json!({
        "tools": [
            {"name": "get_database_schema", "description": "Read the database schema"},
            {"name": "execute_query", "description": "Execute a SQL query"},
            {"name": "get_table_info", "description": "Describe one table"},
            {"name": "get_sample_data", "description": "Sample rows of one table"}
        ]
    }))
}

async fn schema(State(state): State<Arc<MockToolState>>) -> impl IntoResponse {
    if state.fail_schema.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "schema unavailable"})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "database": "data/ai_agent.db",
            "tables": {
                "users": {
                    "columns": [
                        {"name": "id", "type": "INTEGER", "not_null": false, "primary_key": true},
                        {"name": "name", "type": "TEXT", "not_null": true, "primary_key": false},
                        {"name": "age", "type": "INTEGER", "not_null": false, "primary_key": false}
                    ],
                    "row_count": 3
                }
            },
            "total_tables": 1
        })),
    )
}

async fn query(
    State(state): State<Arc<MockToolState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let sql = body["sql"].as_str().unwrap_or_default().to_string();
    state.received_sql.lock().unwrap().push(sql);

    if state.fail_queries.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "SQL error: no such table: ghosts"})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "type": "select",
            "columns": ["id", "name", "email", "age"],
            "rows": user_rows(),
            "row_count": 3
        })),
    )
}

async fn table_info(Path(name): Path<String>) -> impl IntoResponse {
    if name != "users" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("table '{}' does not exist", name)})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "table_name": "users",
            "columns": [{"name": "id", "type": "INTEGER"}],
            "row_count": 3
        })),
    )
}

async fn sample(
    State(state): State<Arc<MockToolState>>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let limit: u64 = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(5);
    state.sample_limits.lock().unwrap().push(limit);

    let rows: Vec<Value> = user_rows()
        .as_array()
        .unwrap()
        .iter()
        .take(limit as usize)
        .cloned()
        .collect();

    Json(json!({
        "table_name": name,
        "actual_count": rows.len(),
        "rows": rows,
        "limit": limit
    }))
}

/// 总是失败的 LLM
pub struct FailingLlm;

#[async_trait]
impl ChatModel for FailingLlm {
    async fn chat(&self, _messages: Vec<Message>) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("upstream LLM returned 503"))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

/// 以模拟 LLM 和给定工具服务器地址启动后端，返回基础 URL
pub async fn spawn_backend(tool_server_url: &str) -> String {
    spawn_backend_with(Arc::new(MockLlm::new()), tool_server_url, None).await
}

pub async fn spawn_backend_with(
    llm: Arc<dyn ChatModel>,
    tool_server_url: &str,
    local_db: Option<SampleDatabase>,
) -> String {
    let tools = McpDatabaseClient::new(tool_server_url, Duration::from_millis(500)).unwrap();
    let mut agent = SqlAgent::new(llm, Arc::new(tools));
    if let Some(db) = local_db {
        agent = agent.with_local_schema(Arc::new(db));
    }

    let state = Arc::new(AppState::new(agent, "mock"));
    let addr = common::serve(create_router(state)).await;
    format!("http://{}", addr)
}
