//! Configuration management for toolchat.
//!
//! Configuration can be set via environment variables:
//! - `OPENROUTER_API_KEY` - Required. Your OpenRouter API key.
//! - `DEFAULT_MODEL` - Optional. The default LLM model to use.
//! - `WORKSPACE_PATH` - Optional. The workspace directory for tool operations. Defaults to current directory.
//! - `MAX_ROUNDS` - Optional. Maximum tool-call rounds per exchange. Defaults to `50`.
//! - `SYSTEM_PROMPT` - Optional. Replaces the built-in system instruction.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenRouter API key
    pub api_key: String,

    /// Default LLM model identifier (OpenRouter format)
    pub default_model: String,

    /// Workspace directory for tool operations
    pub workspace_path: PathBuf,

    /// Maximum tool-call rounds for one exchange
    pub max_rounds: usize,

    /// Optional system-instruction override
    pub system_prompt: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENROUTER_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string()))?;

        let default_model = std::env::var("DEFAULT_MODEL")
            .unwrap_or_else(|_| "anthropic/claude-sonnet-4.5".to_string());

        let workspace_path = std::env::var("WORKSPACE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let max_rounds = std::env::var("MAX_ROUNDS")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MAX_ROUNDS".to_string(), format!("{}", e)))?;

        let system_prompt = std::env::var("SYSTEM_PROMPT").ok();

        Ok(Self {
            api_key,
            default_model,
            workspace_path,
            max_rounds,
            system_prompt,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, default_model: String, workspace_path: PathBuf) -> Self {
        Self {
            api_key,
            default_model,
            workspace_path,
            max_rounds: 50,
            system_prompt: None,
        }
    }
}
