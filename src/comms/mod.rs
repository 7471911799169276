//! External chat channels that feed the [`Relay`](crate::relay::Relay).
//!
//! Telegram is the only channel. It runs until the shared
//! `CancellationToken` is cancelled or its update stream ends.

pub mod telegram;
