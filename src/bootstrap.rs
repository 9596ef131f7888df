//! # Service Bootstrap Module
//!
//! Wires the configured LLM provider, the remote tool-server client and the
//! local sample database into a [`SqlAgent`], then serves the HTTP API.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::core::agent::SqlAgent;
use crate::core::config::{AppConfig, LlmProvider};
use crate::core::llm::ChatModel;
use crate::infrastructure::llm::OpenAIClient;
use crate::infrastructure::mcp_client::McpDatabaseClient;
use crate::infrastructure::mock_llm::MockLlm;
use crate::infrastructure::sample_db::SampleDatabase;
use crate::infrastructure::web::{start_web_server, AppState};

/// Service launcher
pub struct ServiceLauncher {
    config: AppConfig,
}

impl ServiceLauncher {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Validate configuration, build the application state and serve until shutdown
    pub async fn launch(&self) -> Result<()> {
        self.config.validate()?;
        info!(
            provider = %self.config.llm_provider,
            mcp_server = %self.config.mcp_server_url,
            "Launching SQL agent backend..."
        );

        let state = self.build_state()?;
        start_web_server(&self.config.bind_addr(), Arc::new(state)).await
    }

    /// Build the shared application state
    pub fn build_state(&self) -> Result<AppState> {
        let llm = self.build_llm()?;
        let tools = McpDatabaseClient::new(
            self.config.mcp_server_url.clone(),
            self.config.mcp_timeout(),
        )?;

        let mut agent = SqlAgent::new(llm, Arc::new(tools)).with_charts(self.config.enable_charts);
        if let Some(db) = self.open_local_db() {
            agent = agent.with_local_schema(Arc::new(db));
        }

        Ok(AppState::new(agent, self.config.llm_provider.to_string()))
    }

    fn build_llm(&self) -> Result<Arc<dyn ChatModel>> {
        if self.config.llm_provider == LlmProvider::Mock {
            info!("Using mock LLM, no API key required");
            return Ok(Arc::new(MockLlm::new()));
        }

        let settings = self
            .config
            .llm_settings()?
            .ok_or_else(|| anyhow::anyhow!("no LLM settings for {}", self.config.llm_provider))?;
        info!(model = %settings.model, base_url = %settings.base_url, "Using OpenAI-compatible LLM");
        Ok(Arc::new(OpenAIClient::from_settings(&settings)))
    }

    /// The local database is optional: failures are logged and the agent relies on the remote schema
    fn open_local_db(&self) -> Option<SampleDatabase> {
        if self.config.skip_local_db {
            return None;
        }

        match SampleDatabase::open(&self.config.database_path) {
            Ok(db) => {
                info!(path = %db.path(), "Local sample database ready");
                Some(db)
            }
            Err(e) => {
                warn!(path = %self.config.database_path, error = %e, "Local sample database unavailable");
                None
            }
        }
    }
}
