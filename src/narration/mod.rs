//! Natural-language services: move commentary and strategy commands.
//!
//! Both services talk to a [`TextBackend`] chosen once at startup: the real
//! LLM client when a provider is configured (wrapped in a
//! [`FailoverBackend`] when a fallback model is set), otherwise
//! [`OfflineBackend`].
//! Call sites never branch on which one they hold.

mod backend;
mod commentary;
mod interpreter;

pub use backend::{connect_backend, FailoverBackend, OfflineBackend, TextBackend};
pub use commentary::{fallback_commentary, Commentator};
pub use interpreter::{
    CommandInterpreter, StrategyDirective, FALLBACK_RESPONSE, FALLBACK_STRATEGY,
};
