//! Text-generation capability with real, failover and offline implementations.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::config::SessionConfig;
use crate::llm_client::{LlmClient, LlmError};

/// Anything that can turn a system prompt and a user message into text.
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Generates a reply.
    async fn generate(&self, system_prompt: &str, user_message: &str) -> Result<String, LlmError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl TextBackend for LlmClient {
    async fn generate(&self, system_prompt: &str, user_message: &str) -> Result<String, LlmError> {
        LlmClient::generate(self, system_prompt, user_message).await
    }

    fn name(&self) -> &str {
        self.config().model()
    }
}

/// Stand-in used for the whole session when no provider is configured.
///
/// Every request fails, so callers always land on their own fallback text.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineBackend;

#[async_trait]
impl TextBackend for OfflineBackend {
    async fn generate(&self, _system_prompt: &str, _user_message: &str) -> Result<String, LlmError> {
        Err(LlmError::new("Text backend is offline".to_string()))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

/// A primary backend backed by a secondary model.
///
/// Each request goes to the primary first; when it fails the same request
/// is sent once to the fallback.
pub struct FailoverBackend {
    primary: Arc<dyn TextBackend>,
    fallback: Arc<dyn TextBackend>,
}

impl FailoverBackend {
    /// Pairs `primary` with `fallback`.
    pub fn new(primary: Arc<dyn TextBackend>, fallback: Arc<dyn TextBackend>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl TextBackend for FailoverBackend {
    #[instrument(skip_all, fields(primary = self.primary.name(), fallback = self.fallback.name()))]
    async fn generate(&self, system_prompt: &str, user_message: &str) -> Result<String, LlmError> {
        match self.primary.generate(system_prompt, user_message).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(error = %e, "Primary model failed, trying fallback model");
                self.fallback.generate(system_prompt, user_message).await
            }
        }
    }

    fn name(&self) -> &str {
        self.primary.name()
    }
}

impl std::fmt::Debug for FailoverBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailoverBackend")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

/// Picks the session's text backend.
///
/// The primary model is paired with the fallback model when one is
/// configured. A missing API key is a startup-capability failure: it is
/// logged once and the offline stub is installed for the rest of the
/// session.
#[instrument(skip(config), fields(provider = %config.llm_provider()))]
pub fn connect_backend(config: &SessionConfig, force_offline: bool) -> Arc<dyn TextBackend> {
    if force_offline {
        info!("Offline mode requested, using offline text backend");
        return Arc::new(OfflineBackend);
    }

    let primary: Arc<dyn TextBackend> = match config.create_llm_config() {
        Ok(llm_config) => {
            info!(model = %llm_config.model(), "Text backend online");
            Arc::new(LlmClient::new(llm_config))
        }
        Err(e) => {
            warn!(error = %e, "Text backend unavailable, using offline stub");
            return Arc::new(OfflineBackend);
        }
    };

    match config.create_fallback_llm_config() {
        Ok(Some(fallback)) => {
            info!(fallback = %fallback.model(), "Fallback model configured");
            Arc::new(FailoverBackend::new(primary, Arc::new(LlmClient::new(fallback))))
        }
        Ok(None) => primary,
        Err(e) => {
            warn!(error = %e, "Fallback model unavailable");
            primary
        }
    }
}
