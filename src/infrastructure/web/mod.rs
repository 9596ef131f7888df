//! Web 服务器模块
//!
//! 提供 HTTP API：服务信息、健康检查、Agent 信息、数据库信息与 Agent 执行

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::core::agent::{SqlAgent, AGENT_NAME};
use crate::core::observation::into_data_object;
use crate::domain::{QueryRequest, QueryResponse};
use crate::errors::AgentError;

// ==================== 错误响应 ====================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        if err.is_client_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Internal(format!("Agent execution error: {}", err))
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

// ==================== 状态 ====================

pub struct AppState {
    pub agent: SqlAgent,
    /// 当前 LLM 提供方（openai / gemini / mock）
    pub mode: String,
}

impl AppState {
    pub fn new(agent: SqlAgent, mode: impl Into<String>) -> Self {
        Self {
            agent,
            mode: mode.into(),
        }
    }
}

// ==================== 处理器 ====================

/// 根路径
async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "message": "AI Agent Backend API",
        "version": crate::VERSION,
        "description": "Natural-language to SQL agent with reason, action and observe steps",
        "mode": state.mode,
    }))
}

/// 健康检查
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "agent": AGENT_NAME,
        "mode": state.mode,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Agent 信息
async fn agent_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let info = state.agent.describe();
    Json(json!({
        "name": info.name,
        "description": info.description,
        "mode": state.mode,
        "model": info.model,
        "capabilities": info.capabilities,
        "workflow": info.workflow,
        "supported_queries": info.supported_queries,
    }))
}

/// 数据库信息
async fn database_info(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let info = state.agent.database_info().await.map_err(|e| {
        error!(error = %e, "failed to collect database info");
        ApiError::Internal(format!("Unable to load database info: {}", e))
    })?;

    Ok(Json(json!({
        "status": "success",
        "database_info": info,
    })))
}

/// 执行 Agent
///
/// 远程查询失败不会导致请求失败，错误会写入 `data` 并由模型解释；
/// 只有模型调用失败才返回 500。
async fn execute_agent(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected malformed request");
        ApiError::from(rejection)
    })?;
    let query = request.validated_query()?;

    info!(query, "executing agent");
    let outcome = state
        .agent
        .execute(query, request.context.clone())
        .await?;

    Ok(Json(QueryResponse {
        response: outcome.response,
        sql_generated: outcome.sql_generated,
        data: into_data_object(outcome.data),
        reasoning: outcome.reasoning,
        chart_description: outcome.chart_description,
    }))
}

// ==================== 路由 ====================

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/agent-info", get(agent_info))
        .route("/database-info", get(database_info))
        .route("/execute-agent", post(execute_agent))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ==================== 服务器启动 ====================

pub async fn start_web_server(bind_addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Web server started on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
