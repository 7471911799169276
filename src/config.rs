//! Configuration loading from environment variables.
//!
//! Everything is read once at startup into an immutable [`Config`]; there is
//! no config file. A `.env` file, if present, is loaded by `main` before
//! [`load`] runs.

use std::env;
use std::fmt;

use crate::error::AppError;
use crate::logger;

pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_API_KEY: &str = "YANDEX_API_KEY";
pub const ENV_FOLDER_ID: &str = "YANDEX_FOLDER_ID";
pub const ENV_LOG_LEVEL: &str = "RELAY_LOG_LEVEL";
pub const ENV_LLM_PROVIDER: &str = "RELAY_LLM_PROVIDER";
pub const ENV_MODEL: &str = "YANDEX_GPT_MODEL";
pub const ENV_API_URL: &str = "YANDEX_GPT_URL";
pub const ENV_TIMEOUT_SECONDS: &str = "YANDEX_GPT_TIMEOUT_SECONDS";

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LLM_PROVIDER: &str = "yandexgpt";
const DEFAULT_MODEL: &str = "yandexgpt-lite";
const DEFAULT_API_URL: &str = "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";
const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Long-poll wait window passed to Telegram's `getUpdates`.
const POLLING_TIMEOUT_SECONDS: u32 = 60;

/// Telegram channel configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub polling_timeout_seconds: u32,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("polling_timeout_seconds", &self.polling_timeout_seconds)
            .finish()
    }
}

/// YandexGPT completion endpoint configuration.
#[derive(Debug, Clone)]
pub struct YandexGptConfig {
    /// Full completion endpoint URL.
    pub api_url: String,
    /// Model name; the request URI is `gpt://<folder_id>/<model>`.
    pub model: String,
    /// Cloud folder that scopes the model deployment.
    pub folder_id: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM subsystem configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"yandexgpt"` or `"dummy"`).
    pub provider: String,
    pub yandexgpt: YandexGptConfig,
}

/// Fully-resolved relay configuration.
#[derive(Clone)]
pub struct Config {
    pub log_level: String,
    pub telegram: TelegramConfig,
    pub llm: LlmConfig,
    /// API key for the completion service, sent as `Authorization: Api-Key <key>`.
    pub llm_api_key: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("log_level", &self.log_level)
            .field("telegram", &self.telegram)
            .field("llm", &self.llm)
            .field("llm_api_key", &"<redacted>")
            .finish()
    }
}

/// Load config from the process environment.
pub fn load() -> Result<Config, AppError> {
    load_from(|key| env::var(key).ok())
}

/// Internal loader. Resolves every setting through `lookup`.
/// Tests pass a map lookup instead of mutating env vars.
pub fn load_from<F>(lookup: F) -> Result<Config, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    // Empty values count as unset.
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let require = |key: &str| {
        get(key).ok_or_else(|| AppError::Config(format!("{key} is not set")))
    };

    let bot_token = require(ENV_TELEGRAM_BOT_TOKEN)?;
    let llm_api_key = require(ENV_API_KEY)?;
    let folder_id = require(ENV_FOLDER_ID)?;

    let log_level = get(ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    logger::parse_level(&log_level)
        .map_err(|e| AppError::Config(format!("{ENV_LOG_LEVEL}: {e}")))?;

    let timeout_seconds = match get(ENV_TIMEOUT_SECONDS) {
        None => DEFAULT_TIMEOUT_SECONDS,
        Some(raw) => parse_timeout(&raw)?,
    };

    Ok(Config {
        log_level,
        telegram: TelegramConfig {
            bot_token,
            polling_timeout_seconds: POLLING_TIMEOUT_SECONDS,
        },
        llm: LlmConfig {
            provider: get(ENV_LLM_PROVIDER).unwrap_or_else(|| DEFAULT_LLM_PROVIDER.to_string()),
            yandexgpt: YandexGptConfig {
                api_url: get(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                model: get(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                folder_id,
                timeout_seconds,
            },
        },
        llm_api_key,
    })
}

fn parse_timeout(raw: &str) -> Result<u64, AppError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(AppError::Config(format!("{ENV_TIMEOUT_SECONDS} must be greater than zero"))),
        Ok(secs) => Ok(secs),
        Err(e) => Err(AppError::Config(format!(
            "{ENV_TIMEOUT_SECONDS} must be a whole number of seconds, got '{raw}': {e}"
        ))),
    }
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Safe `Config` for unit tests: dummy LLM, fake credentials.
#[cfg(test)]
impl Config {
    pub fn test_default() -> Self {
        Self {
            log_level: "info".into(),
            telegram: TelegramConfig {
                bot_token: "123:test".into(),
                polling_timeout_seconds: POLLING_TIMEOUT_SECONDS,
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                yandexgpt: YandexGptConfig {
                    api_url: "http://localhost:0/foundationModels/v1/completion".into(),
                    model: "test-model".into(),
                    folder_id: "test-folder".into(),
                    timeout_seconds: 1,
                },
            },
            llm_api_key: "test-key".into(),
        }
    }
}
