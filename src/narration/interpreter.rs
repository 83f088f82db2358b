//! Free-text strategy commands.
//!
//! The backend is asked for a JSON object with exactly two fields. The reply
//! is decoded strictly into [`StrategyDirective`]; anything else maps to the
//! fixed fallback pair.

use std::sync::Arc;
use std::time::Duration;

use derive_getters::Getters;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use super::TextBackend;

/// Strategy installed when a command cannot be understood.
pub const FALLBACK_STRATEGY: &str = "flexible response";

/// Reply shown when a command cannot be understood.
pub const FALLBACK_RESPONSE: &str = "(Could not understand your strategy, please try again)";

/// A decoded strategy command.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Deserialize)]
pub struct StrategyDirective {
    /// Short strategy label.
    strategy: String,
    /// Confirmation sentence to show the user.
    response: String,
}

impl StrategyDirective {
    /// Creates a directive.
    pub fn new(strategy: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            response: response.into(),
        }
    }

    /// The fixed pair used on any failure.
    pub fn fallback() -> Self {
        Self::new(FALLBACK_STRATEGY, FALLBACK_RESPONSE)
    }

    /// Strictly decodes a backend reply.
    ///
    /// A surrounding markdown code fence is tolerated; the content must be
    /// a JSON object with string fields `strategy` (non-blank) and
    /// `response`.
    #[instrument(skip(reply), fields(len = reply.len()))]
    pub fn decode(reply: &str) -> Option<Self> {
        let body = strip_code_fence(reply);
        match serde_json::from_str::<Self>(body) {
            Ok(directive) if !directive.strategy.trim().is_empty() => Some(Self::new(
                directive.strategy.trim(),
                directive.response.trim(),
            )),
            Ok(_) => {
                debug!("Directive has a blank strategy");
                None
            }
            Err(e) => {
                debug!(error = %e, "Reply is not a strategy directive");
                None
            }
        }
    }
}

/// Removes a leading ```lang line and a trailing ``` if both are present.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };
    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim(),
        None => inner.trim(),
    }
}

/// Turns user commands into strategy labels.
#[derive(Clone)]
pub struct CommandInterpreter {
    backend: Arc<dyn TextBackend>,
    language: String,
    timeout: Option<Duration>,
}

impl CommandInterpreter {
    /// Creates an interpreter on top of `backend`.
    pub fn new(backend: Arc<dyn TextBackend>, language: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            backend,
            language: language.into(),
            timeout,
        }
    }

    /// Interprets a free-text command.
    ///
    /// Never fails: backend errors, timeouts, and undecodable replies all
    /// yield [`StrategyDirective::fallback`].
    #[instrument(skip(self), fields(backend = self.backend.name()))]
    pub async fn interpret(&self, text: &str) -> StrategyDirective {
        let system_prompt = format!(
            "You are a chess AI strategy assistant. Reply only with a JSON object of the form \
             {{\"strategy\": \"<short strategy name>\", \"response\": \"<confirmation to the user in {}>\"}}. \
             If the requested strategy is unclear, set strategy to \"{}\".",
            self.language, FALLBACK_STRATEGY
        );
        let user_message = format!("The user says: \"{}\"", text);

        let call = self.backend.generate(&system_prompt, &user_message);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    error!(timeout = ?limit, "Strategy request timed out");
                    return StrategyDirective::fallback();
                }
            },
            None => call.await,
        };

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Failed to interpret command");
                return StrategyDirective::fallback();
            }
        };

        match StrategyDirective::decode(&reply) {
            Some(directive) => {
                info!(strategy = %directive.strategy, "Strategy command interpreted");
                directive
            }
            None => {
                error!(reply = %reply, "Failed to parse strategy reply");
                StrategyDirective::fallback()
            }
        }
    }
}

impl std::fmt::Debug for CommandInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandInterpreter")
            .field("backend", &self.backend.name())
            .field("language", &self.language)
            .field("timeout", &self.timeout)
            .finish()
    }
}
