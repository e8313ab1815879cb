// ABOUTME: Error types for threadbot-telegram.
// ABOUTME: Defines BotError covering config, Telegram and core failures.

use thiserror::Error;

/// Error types for the Telegram front end.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration loading or validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Telegram API error from teloxide.
    #[error("Telegram API error: {0}")]
    Telegram(String),

    /// Telegram request error from teloxide.
    #[error("Telegram request error: {0}")]
    TeloxideRequest(#[from] teloxide::RequestError),

    /// Repository, dispatch or backend error.
    #[error(transparent)]
    Core(#[from] threadbot_core::Error),
}

/// Result type alias using BotError.
pub type Result<T> = std::result::Result<T, BotError>;
