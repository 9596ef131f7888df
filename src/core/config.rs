//! 配置管理
//!
//! 所有参数既可通过命令行传入，也可从环境变量（含 `.env`）读取

use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::Parser;

use crate::errors::{AgentError, Result};

/// LLM 提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// OpenAI 官方接口
    OpenAI,
    /// Gemini（OpenAI 兼容接口）
    Gemini,
    /// 离线模拟，不需要 API Key
    Mock,
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "gemini" => Ok(LlmProvider::Gemini),
            "mock" => Ok(LlmProvider::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::OpenAI => write!(f, "openai"),
            LlmProvider::Gemini => write!(f, "gemini"),
            LlmProvider::Mock => write!(f, "mock"),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Natural-language to SQL agent backend (reason / action / observe)"
)]
pub struct AppConfig {
    // 服务配置
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// 调试模式，强制 debug 日志级别
    #[arg(long, env = "DEBUG", value_parser = BoolishValueParser::new())]
    pub debug: bool,

    /// 日志级别（RUST_LOG 优先）
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    // 数据库配置
    /// 本地示例数据库路径
    #[arg(long, env = "DATABASE_PATH", default_value = "data/ai_agent.db")]
    pub database_path: String,

    /// 不初始化本地示例数据库
    #[arg(long, env = "SKIP_LOCAL_DB", value_parser = BoolishValueParser::new())]
    pub skip_local_db: bool,

    // 远程工具服务器
    #[arg(long, env = "MCP_SERVER_URL", default_value = "http://localhost:8001")]
    pub mcp_server_url: String,

    #[arg(long, env = "MCP_TIMEOUT_SECS", default_value_t = 30)]
    pub mcp_timeout_secs: u64,

    // LLM 配置
    /// LLM 提供方: openai, gemini, mock
    #[arg(long, env = "LLM_PROVIDER", default_value = "openai")]
    pub llm_provider: LlmProvider,

    #[arg(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-3.5-turbo")]
    pub openai_model: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    #[arg(long, env = "GEMINI_API_KEY")]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-flash")]
    pub gemini_model: String,

    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com/v1beta/openai"
    )]
    pub gemini_base_url: String,

    #[arg(long, env = "LLM_TEMPERATURE", default_value_t = 0.1)]
    pub llm_temperature: f32,

    /// 多行数值结果时追加图表建议步骤
    #[arg(long, env = "ENABLE_CHARTS", value_parser = BoolishValueParser::new())]
    pub enable_charts: bool,
}

/// 选定提供方后的 LLM 连接参数
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
}

impl AppConfig {
    /// 校验配置，缺少所选提供方的 API Key 时失败
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(AgentError::Config("PORT must be greater than 0".to_string()));
        }
        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(AgentError::Config(format!(
                "LLM_TEMPERATURE must be within 0.0..=2.0, got {}",
                self.llm_temperature
            )));
        }
        self.llm_settings().map(|_| ())
    }

    /// 当前提供方的连接参数，mock 模式返回 None
    pub fn llm_settings(&self) -> Result<Option<LlmSettings>> {
        let (key, key_name, model, base_url) = match self.llm_provider {
            LlmProvider::Mock => return Ok(None),
            LlmProvider::OpenAI => (
                &self.openai_api_key,
                "OPENAI_API_KEY",
                &self.openai_model,
                &self.openai_base_url,
            ),
            LlmProvider::Gemini => (
                &self.gemini_api_key,
                "GEMINI_API_KEY",
                &self.gemini_model,
                &self.gemini_base_url,
            ),
        };

        let api_key = key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                AgentError::Config(format!(
                    "{} must be set when LLM_PROVIDER={}",
                    key_name, self.llm_provider
                ))
            })?;

        Ok(Some(LlmSettings {
            api_key: api_key.to_string(),
            model: model.clone(),
            base_url: base_url.clone(),
            temperature: self.llm_temperature,
        }))
    }

    /// 实际生效的日志级别
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn mcp_timeout(&self) -> Duration {
        Duration::from_secs(self.mcp_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AppConfig {
        let mut argv = vec!["sql-agent-backend"];
        argv.extend_from_slice(args);
        AppConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = parse(&["--llm-provider", "mock"]);
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.database_path, "data/ai_agent.db");
        assert_eq!(cfg.mcp_server_url, "http://localhost:8001");
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8000");
        assert_eq!(cfg.mcp_timeout(), Duration::from_secs(30));
        assert!(!cfg.enable_charts);
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!("gemini".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert!("claude-local".parse::<LlmProvider>().is_err());
        assert_eq!(LlmProvider::Mock.to_string(), "mock");
    }

    #[test]
    fn test_mock_provider_needs_no_key() {
        let cfg = parse(&["--llm-provider", "mock"]);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.llm_settings().unwrap(), None);
    }

    #[test]
    fn test_openai_requires_key() {
        let cfg = parse(&["--llm-provider", "openai", "--openai-api-key", "  "]);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_gemini_settings_use_gemini_fields() {
        let cfg = parse(&[
            "--llm-provider",
            "gemini",
            "--gemini-api-key",
            "g-key",
            "--gemini-model",
            "gemini-2.0-flash",
        ]);
        let settings = cfg.llm_settings().unwrap().unwrap();
        assert_eq!(settings.api_key, "g-key");
        assert_eq!(settings.model, "gemini-2.0-flash");
        assert!(settings.base_url.contains("generativelanguage"));
    }

    #[test]
    fn test_debug_overrides_log_level() {
        let cfg = parse(&["--llm-provider", "mock", "--log-level", "warn"]);
        assert_eq!(cfg.effective_log_level(), "warn");

        let cfg = parse(&["--llm-provider", "mock", "--log-level", "warn", "--debug"]);
        assert_eq!(cfg.effective_log_level(), "debug");
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let cfg = parse(&["--llm-provider", "mock", "--llm-temperature", "3.5"]);
        assert!(matches!(cfg.validate(), Err(AgentError::Config(_))));
    }
}
