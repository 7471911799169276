//! GPT relay bot: forwards Telegram messages to a YandexGPT completion
//! endpoint and sends the model's reply back to the chat.

pub mod comms;
pub mod config;
pub mod error;
pub mod llm;
pub mod logger;
pub mod relay;
