//! Dummy LLM provider: echoes input back prefixed with `[echo]`.
//! Used for smoke runs against Telegram without a completion service.

use crate::llm::{Completion, ProviderError};

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, content: &str) -> Result<Completion, ProviderError> {
        Ok(Completion::Reply(format!("[echo] {content}")))
    }
}
