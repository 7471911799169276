//! Telegram comms channel: long-polls for updates, hands each message to the
//! relay, and replies back to the originating chat.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

use crate::config::TelegramConfig;
use crate::error::AppError;
use crate::relay::{IncomingMessage, Relay};

// ── Constants ────────────────────────────────────────────────────────────────

/// Telegram has a 4096 character limit per message.
/// We chunk at 4000 to be safe.
const MAX_MESSAGE_LENGTH: usize = 4000;

/// Extra headroom on the bot HTTP client over the long-poll window.
const CLIENT_TIMEOUT_MARGIN_SECS: u64 = 10;

// ── run ──────────────────────────────────────────────────────────────────────

/// Connect to Telegram and process updates one at a time until `shutdown`
/// is cancelled.
///
/// A bad token or unreachable API fails here with [`AppError::Startup`],
/// before any update is consumed.
pub async fn run(
    config: &TelegramConfig,
    relay: Relay,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let polling_timeout = Duration::from_secs(u64::from(config.polling_timeout_seconds));

    let client = teloxide::net::default_reqwest_settings()
        .timeout(polling_timeout + Duration::from_secs(CLIENT_TIMEOUT_MARGIN_SECS))
        .build()
        .map_err(|e| AppError::Startup(format!("failed to build telegram HTTP client: {e}")))?;
    let bot = Bot::with_client(config.bot_token.clone(), client);

    let me = bot
        .get_me()
        .await
        .map_err(|e| AppError::Startup(format!("telegram login failed: {e}")))?;
    info!(
        username = me.user.username.as_deref().unwrap_or("-"),
        "telegram bot started"
    );

    let handler = Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
        let relay = relay.clone();
        async move {
            for chunk in outbound_chunks(&relay, &incoming_from(&msg)).await {
                if let Err(e) = bot.send_message(msg.chat.id, chunk).await {
                    warn!(chat_id = msg.chat.id.0, "failed to send telegram reply: {e}");
                }
            }
            respond(())
        }
    });

    let listener = Polling::builder(bot.clone()).timeout(polling_timeout).build();

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .default_handler(|upd| async move {
            trace!(update_id = ?upd.id, "skipping non-message update");
        })
        // A single key puts every update in one queue: strictly in order.
        .distribution_function(|_| Some(()))
        .build();

    tokio::select! {
        biased;

        _ = shutdown.cancelled() => {
            info!("shutdown signal received, closing telegram channel");
        }
        _ = dispatcher.dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("telegram update listener error"),
        ) => {
            warn!("telegram dispatcher exited unexpectedly");
        }
    }

    Ok(())
}

/// Messages to send back for one incoming message, in order. Empty when the
/// relay has nothing to say.
async fn outbound_chunks(relay: &Relay, incoming: &IncomingMessage) -> Vec<String> {
    match relay.handle(incoming).await {
        Some(reply) => split_message(&reply, MAX_MESSAGE_LENGTH),
        None => Vec::new(),
    }
}

fn incoming_from(msg: &Message) -> IncomingMessage {
    IncomingMessage {
        chat_id: msg.chat.id.0,
        sender: msg.from.as_ref().and_then(|u| u.username.clone()),
        text: msg.text().map(str::to_string),
    }
}

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Counts `char`s, not bytes, so multi-byte text is never cut mid-codepoint.
fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
