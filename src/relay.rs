//! Per-update dispatch: decide whether an incoming message gets a reply,
//! ask the provider, and turn failures into a visible error reply.
//!
//! Channels own the transport; [`Relay::handle`] only maps one message to
//! at most one reply string and never fails.

use tracing::{debug, info, warn};

use crate::llm::{Completion, LlmProvider};

/// Prefix of every reply produced from a provider failure.
pub const ERROR_PREFIX: &str = "⚠️ Error: ";

/// One inbound chat message, detached from the channel's own types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub sender: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Relay {
    provider: LlmProvider,
}

impl Relay {
    pub fn new(provider: LlmProvider) -> Self {
        Self { provider }
    }

    /// Return the reply for `msg`, or `None` when it carries no text.
    pub async fn handle(&self, msg: &IncomingMessage) -> Option<String> {
        let Some(text) = msg.text.as_deref().filter(|t| !t.trim().is_empty()) else {
            debug!(chat_id = msg.chat_id, "skipping message without text");
            return None;
        };

        info!(
            chat_id = msg.chat_id,
            from = msg.sender.as_deref().unwrap_or("-"),
            content_len = text.len(),
            "relaying message"
        );

        let reply = match self.provider.complete(text).await {
            Ok(completion) => {
                match &completion {
                    Completion::Reply(_) => {}
                    Completion::NoAlternatives => {
                        debug!(chat_id = msg.chat_id, "completion returned no alternatives");
                    }
                    Completion::UnexpectedShape => {
                        warn!(chat_id = msg.chat_id, "completion response had an unexpected shape");
                    }
                }
                completion.into_text()
            }
            Err(e) => {
                warn!(chat_id = msg.chat_id, error = %e, "completion failed");
                format!("{ERROR_PREFIX}{e}")
            }
        };

        Some(reply)
    }
}
