// ABOUTME: Configuration loading and validation for the Telegram bot.
// ABOUTME: Supports TOML config files with environment variable expansion, or plain env tokens.

use crate::error::{BotError, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use threadbot_core::backend::{OpenAiConfig, DEFAULT_API_BASE};
use threadbot_core::DispatchConfig;
use tracing::{info, warn};

/// Top-level configuration structure for threadbot-telegram.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub openai: OpenAiSettings,
    #[serde(default)]
    pub bot: BotConfig,
}

/// Telegram bot credentials for Long Polling connection.
#[derive(Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather (e.g., "123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11").
    pub bot_token: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .finish()
    }
}

/// Completion API credentials and endpoint.
#[derive(Clone, Deserialize)]
pub struct OpenAiSettings {
    pub api_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl OpenAiSettings {
    fn new(api_key: String) -> Self {
        Self {
            api_key,
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    pub fn backend_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            api_base: self.api_base.clone(),
            api_key: self.api_key.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Bot behavior configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// List of allowed chat IDs (empty = allow all chats the bot is in).
    #[serde(default)]
    pub allowed_chats: Vec<i64>,

    /// Overall time budget for one command.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Seconds between typing indicators while a command runs.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            allowed_chats: Vec::new(),
            command_timeout_secs: default_command_timeout_secs(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
        }
    }
}

fn default_command_timeout_secs() -> u64 {
    300
}

fn default_heartbeat_interval_secs() -> u64 {
    3
}

impl BotConfig {
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            deadline: Duration::from_secs(self.command_timeout_secs),
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval_secs),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("threadbot").join("telegram.toml"))
}

impl Config {
    /// Load configuration from the specified path or default location.
    ///
    /// Default location: `~/.config/threadbot/telegram.toml`. When no path is
    /// given and the default file does not exist, the `TELEGRAM_TOKEN` and
    /// `OPENAI_TOKEN` environment variables are used instead.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    info!("No config file found, reading tokens from environment");
                    return Self::from_env_vars(|var| std::env::var(var).ok());
                }
            },
        };

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            BotError::Config(format!("Failed to read config from {:?}: {}", path, e))
        })?;

        // Expand environment variables, warning on undefined vars.
        let contents = shellexpand::env_with_context_no_errors(&contents, |var: &str| {
            match std::env::var(var) {
                Ok(val) => Some(val),
                Err(_) => {
                    warn!(
                        variable = %var,
                        "Environment variable not defined, using empty string"
                    );
                    Some(String::new())
                }
            }
        });

        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| BotError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Build configuration from token variables, all other settings default.
    pub fn from_env_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bot_token = non_empty("TELEGRAM_TOKEN")
            .ok_or_else(|| BotError::Config("no telegram token set (TELEGRAM_TOKEN)".into()))?;
        let api_key = non_empty("OPENAI_TOKEN")
            .ok_or_else(|| BotError::Config("no openai token set (OPENAI_TOKEN)".into()))?;

        let config = Config {
            telegram: TelegramConfig { bot_token },
            openai: OpenAiSettings::new(api_key),
            bot: BotConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate that required fields are present and properly formatted.
    fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            return Err(BotError::Config("telegram.bot_token is required".into()));
        }
        // Telegram bot tokens have format: <bot_id>:<token_string>
        if !self.telegram.bot_token.contains(':') {
            return Err(BotError::Config(
                "telegram.bot_token must contain ':' (format: BOT_ID:TOKEN_STRING)".into(),
            ));
        }
        if self.openai.api_key.trim().is_empty() {
            return Err(BotError::Config("openai.api_key is required".into()));
        }
        if self.bot.heartbeat_interval_secs == 0 {
            return Err(BotError::Config(
                "bot.heartbeat_interval_secs must be greater than 0".into(),
            ));
        }
        if self.bot.command_timeout_secs == 0 {
            return Err(BotError::Config(
                "bot.command_timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Check if a chat is in the allowed list.
    /// Returns true if allowed_chats is empty (allow all) or chat is in list.
    pub fn is_chat_allowed(&self, chat_id: i64) -> bool {
        self.bot.allowed_chats.is_empty() || self.bot.allowed_chats.contains(&chat_id)
    }
}
