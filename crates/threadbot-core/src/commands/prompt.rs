// ABOUTME: Conversation handler used by /prompt and by plain replies.
// ABOUTME: Replays thread history to the completion backend and records the answer.

use crate::backend::CompletionRequest;
use crate::dispatch::{Handler, HandlerContext};
use crate::error::{Error, Result};
use crate::message::{Message, MessageKind};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct Prompt;

impl Prompt {
    /// History lines followed by an open line for the bot, separated by blank lines.
    pub fn build_prompt(msg: &Message, bot_name: &str) -> String {
        let mut lines = msg.history();
        lines.push(format!("{}:", bot_name));
        lines.join("\n\n")
    }
}

#[async_trait]
impl Handler for Prompt {
    fn name(&self) -> &'static str {
        "prompt"
    }

    fn records_as(&self) -> MessageKind {
        MessageKind::Prompt
    }

    async fn exec(&self, ctx: &HandlerContext, msg: Arc<Message>) -> Result<()> {
        let thread = ctx.repo.get_thread(&msg.thread_id).await?;
        let bot_name = ctx.transport.bot_user().display_name();
        let prompt = Self::build_prompt(&msg, &bot_name);

        debug!(
            thread_id = %thread.id,
            model = %thread.settings.model,
            "Calling completion backend"
        );
        let request = CompletionRequest::from_settings(prompt, &thread.settings, Vec::new());
        let completion = ctx.backend.complete(request).await?;

        let text = completion.trim();
        if text.is_empty() {
            return Err(Error::Backend("completion was empty".into()));
        }

        ctx.reply(&msg, text, MessageKind::Response).await?;
        Ok(())
    }
}
