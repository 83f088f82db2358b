//! Session configuration.

use crate::chess::Side;
use crate::llm_client::{LlmConfig, LlmProvider};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Configuration for one play session.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Path to the UCI engine executable.
    #[serde(default = "default_engine_path")]
    engine_path: String,

    /// Per-move search budget in milliseconds.
    #[serde(default = "default_engine_time_limit_ms")]
    engine_time_limit_ms: u64,

    /// Bound on the startup handshake with the engine, in milliseconds.
    #[serde(default = "default_engine_handshake_timeout_ms")]
    engine_handshake_timeout_ms: u64,

    /// LLM provider (gemini, openai or anthropic).
    #[serde(default = "default_provider")]
    llm_provider: LlmProvider,

    /// LLM model name (e.g., "gemini-1.5-flash", "gpt-4o-mini").
    #[serde(default = "default_model")]
    llm_model: String,

    /// Model tried when a request to `llm_model` fails (blank = none).
    #[serde(default = "default_fallback_model")]
    llm_fallback_model: String,

    /// Maximum tokens for LLM responses.
    #[serde(default = "default_max_tokens")]
    llm_max_tokens: u32,

    /// Timeout for each commentary or command request, in seconds (0 = none).
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,

    /// Strategy label at session start.
    #[serde(default = "default_strategy")]
    default_strategy: String,

    /// Colour the human plays.
    #[serde(default = "default_human_side")]
    human_side: Side,

    /// Language the backend is asked to answer in.
    #[serde(default = "default_language")]
    commentary_language: String,

    /// File receiving tracing output.
    #[serde(default = "default_log_file")]
    log_file: String,
}

#[instrument]
fn default_engine_path() -> String {
    std::env::var("STOCKFISH_PATH").unwrap_or_else(|_| "stockfish".to_string())
}

fn default_engine_time_limit_ms() -> u64 {
    500
}

fn default_engine_handshake_timeout_ms() -> u64 {
    5_000
}

fn default_provider() -> LlmProvider {
    LlmProvider::Gemini
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_fallback_model() -> String {
    "gemini-1.5-flash-8b".to_string()
}

fn default_max_tokens() -> u32 {
    150
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_strategy() -> String {
    "control the center".to_string()
}

fn default_human_side() -> Side {
    Side::White
}

fn default_language() -> String {
    "English".to_string()
}

fn default_log_file() -> String {
    "chess_companion.log".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engine_path: default_engine_path(),
            engine_time_limit_ms: default_engine_time_limit_ms(),
            engine_handshake_timeout_ms: default_engine_handshake_timeout_ms(),
            llm_provider: default_provider(),
            llm_model: default_model(),
            llm_fallback_model: default_fallback_model(),
            llm_max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            default_strategy: default_strategy(),
            human_side: default_human_side(),
            commentary_language: default_language(),
            log_file: default_log_file(),
        }
    }
}

impl SessionConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::new(format!("Failed to read config file: {}", e))
        })?;

        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| {
            ConfigError::new(format!("Failed to parse config: {}", e))
        })?;

        info!(provider = %config.llm_provider, human = %config.human_side, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Overrides the engine executable path.
    pub fn with_engine_path(mut self, path: impl Into<String>) -> Self {
        self.engine_path = path.into();
        self
    }

    /// Overrides the human's colour.
    pub fn with_human_side(mut self, side: Side) -> Self {
        self.human_side = side;
        self
    }

    /// Per-move engine budget.
    pub fn engine_time_limit(&self) -> Duration {
        Duration::from_millis(self.engine_time_limit_ms)
    }

    /// Engine startup handshake bound.
    pub fn engine_handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.engine_handshake_timeout_ms)
    }

    /// Timeout imposed on each text-backend call, if any.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Creates LLM configuration from this session config.
    /// Requires the provider's API key environment variable.
    #[instrument(skip(self), fields(provider = ?self.llm_provider, model = %self.llm_model))]
    pub fn create_llm_config(&self) -> Result<LlmConfig, ConfigError> {
        debug!("Creating LLM config");

        let var = self.llm_provider.api_key_var();
        let api_key = std::env::var(var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::new(format!("{} environment variable not set", var)))?;

        Ok(LlmConfig::new(
            self.llm_provider,
            api_key,
            self.llm_model.clone(),
            self.llm_max_tokens,
        ))
    }

    /// LLM configuration for the fallback model, sharing the primary's key.
    ///
    /// `Ok(None)` when no distinct fallback model is configured.
    #[instrument(skip(self), fields(fallback = %self.llm_fallback_model))]
    pub fn create_fallback_llm_config(&self) -> Result<Option<LlmConfig>, ConfigError> {
        let fallback = self.llm_fallback_model.trim();
        if fallback.is_empty() || fallback == self.llm_model {
            return Ok(None);
        }
        Ok(Some(self.create_llm_config()?.with_model(fallback)))
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
