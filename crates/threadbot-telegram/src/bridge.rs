// ABOUTME: Glue between Telegram updates and the threadbot dispatch core.
// ABOUTME: Filters chats, converts messages to events and hands them to the dispatcher.

use crate::config::Config;
use crate::error::Result;
use crate::telegram::{event_from_message, TelegramTransport};

use std::sync::Arc;
use teloxide::types::Message;
use threadbot_core::commands::default_registry;
use threadbot_core::{Dispatcher, HandlerContext, OpenAiBackend, Repository};
use tracing::{debug, info};

/// The Bridge ties together the Telegram transport, completion backend and repository.
pub struct Bridge {
    config: Config,
    telegram: Arc<TelegramTransport>,
    dispatcher: Dispatcher,
}

impl Bridge {
    /// Create a new Bridge with the given configuration.
    /// Authenticates with Telegram and prepares the completion client.
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing Telegram bot bridge");

        let telegram = Arc::new(TelegramTransport::new(&config.telegram).await?);
        let backend = Arc::new(OpenAiBackend::new(config.openai.backend_config())?);

        let ctx = HandlerContext {
            repo: Arc::new(Repository::new()),
            transport: telegram.clone(),
            backend,
        };
        let dispatcher = Dispatcher::new(default_registry(), ctx, config.bot.dispatch_config());

        Ok(Self {
            config,
            telegram,
            dispatcher,
        })
    }

    /// Get a reference to the Telegram transport.
    pub fn telegram(&self) -> &TelegramTransport {
        &self.telegram
    }

    /// Handle an incoming Telegram message.
    ///
    /// Returns as soon as the work is scheduled; the handler and its typing
    /// indicator run in the background.
    pub fn handle_message(&self, msg: &Message) {
        let chat_id = msg.chat.id.0;

        // Check if chat is allowed
        if !self.config.is_chat_allowed(chat_id) {
            debug!(chat_id = %chat_id, "Message from non-allowed chat, ignoring");
            return;
        }

        // Ignore messages from the bot itself
        if msg
            .from
            .as_ref()
            .is_some_and(|user| user.id == self.telegram.bot_id())
        {
            return;
        }

        let Some(event) = event_from_message(msg) else {
            debug!(chat_id = %chat_id, "Message without text, ignoring");
            return;
        };

        if self.dispatcher.dispatch(event).is_none() {
            debug!(chat_id = %chat_id, message_id = msg.id.0, "Message not dispatched");
        }
    }
}
