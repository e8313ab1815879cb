// ABOUTME: Telegram transport using teloxide Long Polling.
// ABOUTME: Converts Telegram messages to chat events and implements ChatTransport for the dispatcher.

use crate::config::TelegramConfig;
use crate::error::{BotError, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, Me, MessageId, ReplyParameters};
use threadbot_core::{ChatEvent, ChatTransport, CommandInvocation, User};
use tracing::{debug, info};

/// Telegram bot wrapper for Long Polling communication.
pub struct TelegramTransport {
    bot: Bot,
    me: Me,
    user: User,
}

impl TelegramTransport {
    /// Create a new Telegram bot client and authenticate.
    pub async fn new(config: &TelegramConfig) -> Result<Self> {
        info!("Initializing Telegram bot");

        let bot = Bot::new(&config.bot_token);

        // Test authentication and get bot info
        let me = bot.get_me().await.map_err(|e| {
            BotError::Telegram(format!("Failed to authenticate with Telegram: {}", e))
        })?;

        info!(
            bot_id = me.id.0,
            bot_username = ?me.username(),
            "Telegram authentication successful"
        );

        let user = user_from_telegram(&me.user);
        Ok(Self { bot, me, user })
    }

    /// Get the bot's user ID.
    pub fn bot_id(&self) -> UserId {
        self.me.id
    }

    /// Get a reference to the underlying teloxide Bot.
    pub fn inner(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_message(
        &self,
        channel_id: i64,
        text: &str,
        reply_to: Option<i32>,
    ) -> threadbot_core::Result<ChatEvent> {
        debug!(
            chat_id = channel_id,
            reply_to = ?reply_to,
            "Sending message to Telegram"
        );

        let mut request = self.bot.send_message(ChatId(channel_id), text);
        if let Some(msg_id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(msg_id)));
        }

        let message = request
            .await
            .map_err(|e| threadbot_core::Error::Transport(e.to_string()))?;

        debug!(message_id = message.id.0, "Message sent successfully");

        event_from_message(&message).ok_or_else(|| {
            threadbot_core::Error::Transport("sent message has no text content".into())
        })
    }

    async fn signal_working(&self, channel_id: i64) -> threadbot_core::Result<()> {
        self.bot
            .send_chat_action(ChatId(channel_id), ChatAction::Typing)
            .await
            .map_err(|e| {
                threadbot_core::Error::Transport(format!("set typing status: {}", e))
            })?;
        Ok(())
    }

    fn bot_user(&self) -> &User {
        &self.user
    }
}

/// Map a Telegram user onto the core identity.
pub fn user_from_telegram(user: &teloxide::types::User) -> User {
    User {
        id: user.id.0 as i64,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone().unwrap_or_default(),
        username: user.username.clone(),
    }
}

/// Parse a bot command such as `/tweak@my_bot MaxTokens=100`.
///
/// Any `@botname` suffix is dropped from the command name, whichever bot it names.
pub fn parse_command(text: &str) -> Option<CommandInvocation> {
    let rest = text.strip_prefix('/')?;
    let (head, arguments) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };

    let name = head.split_once('@').map_or(head, |(name, _)| name);

    if name.is_empty() {
        return None;
    }

    Some(CommandInvocation::new(name, arguments))
}

fn message_key(msg: &Message) -> threadbot_core::MessageId {
    threadbot_core::MessageId {
        channel_id: msg.chat.id.0,
        sender_id: msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or_default(),
        message_number: msg.id.0,
    }
}

/// Convert a Telegram text message into a chat event. Non-text messages yield None.
pub fn event_from_message(msg: &Message) -> Option<ChatEvent> {
    let text = msg.text()?.to_string();
    let command = parse_command(&text);
    let reply_to = msg.reply_to_message().map(message_key);

    Some(ChatEvent {
        channel_id: msg.chat.id.0,
        message_number: msg.id.0,
        sender: msg.from.as_ref().map(user_from_telegram),
        text,
        command,
        reply_to,
    })
}
