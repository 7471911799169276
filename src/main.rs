//! GPT relay bot entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config from the environment
//!   3. Init logger at the configured level
//!   4. Build the LLM provider
//!   5. Run the Telegram channel until Ctrl-C

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use gpt_relay_bot::comms::telegram;
use gpt_relay_bot::config;
use gpt_relay_bot::error::AppError;
use gpt_relay_bot::llm::providers;
use gpt_relay_bot::logger;
use gpt_relay_bot::relay::Relay;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let config = config::load()?;

    logger::init(&config.log_level, false)?;

    info!(
        provider = %config.llm.provider,
        model = %config.llm.yandexgpt.model,
        folder_id = %config.llm.yandexgpt.folder_id,
        timeout_seconds = config.llm.yandexgpt.timeout_seconds,
        "config loaded"
    );

    let provider = providers::build(&config.llm, config.llm_api_key.clone())
        .map_err(|e| AppError::Startup(e.to_string()))?;
    let relay = Relay::new(provider);

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("ctrl-c received");
                    shutdown.cancel();
                }
                Err(e) => warn!("cannot listen for ctrl-c: {e}"),
            }
        });
    }

    telegram::run(&config.telegram, relay, shutdown).await
}
