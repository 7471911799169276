//! LLM provider implementations.
//!
//! `build(config, api_key)` is the factory, called at startup.
//! Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod yandexgpt;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct a `LlmProvider` from config and the completion-service API key.
pub fn build(config: &LlmConfig, api_key: String) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "yandexgpt" => {
            let y = &config.yandexgpt;
            let p = yandexgpt::YandexGptProvider::new(
                y.api_url.clone(),
                y.model.clone(),
                y.folder_id.clone(),
                api_key,
                y.timeout_seconds,
            )?;
            Ok(LlmProvider::YandexGpt(p))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}
