//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities; clone them freely.
//! The `complete` method is `async fn` on the enum so callers need no
//! trait-object machinery.

pub mod providers;

use thiserror::Error;

/// Reply used when the service answers without a usable text.
pub const NO_REPLY_PLACEHOLDER: &str = "no reply received";

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("failed to serialize request: {0}")]
    Serialization(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("completion service returned {0}")]
    Status(String),
    #[error("response body is not valid JSON: {0}")]
    Decode(String),
}

// ── Completion outcome ────────────────────────────────────────────────────────

/// Result of one successful round trip.
///
/// Only `Reply` carries model output. The other two variants are kept apart
/// so callers can tell an empty answer from a response shape they did not
/// expect; both render as [`NO_REPLY_PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Reply(String),
    NoAlternatives,
    UnexpectedShape,
}

impl Completion {
    /// Text to send back to the user. A blank reply renders as the placeholder
    /// because Telegram rejects empty messages.
    pub fn into_text(self) -> String {
        match self {
            Completion::Reply(text) if !text.trim().is_empty() => text,
            _ => NO_REPLY_PLACEHOLDER.to_string(),
        }
    }
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    YandexGpt(providers::yandexgpt::YandexGptProvider),
}

impl LlmProvider {
    /// Send `content` as a single user turn and return the parsed outcome.
    pub async fn complete(&self, content: &str) -> Result<Completion, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(content).await,
            LlmProvider::YandexGpt(p) => p.complete(content).await,
        }
    }
}
