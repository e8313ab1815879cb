// ABOUTME: /help command: lists commands and the tweak grammar.

use crate::dispatch::{Handler, HandlerContext};
use crate::error::Result;
use crate::message::{Message, MessageKind};
use crate::tweak::TWEAK_PARAM_HELP;
use async_trait::async_trait;
use std::sync::Arc;

pub struct Help;

pub fn help_text() -> String {
    let mut b = String::new();
    b.push_str("```\n");
    b.push_str("Commands:\n");
    b.push_str("  /prompt <text>: Initiate a new thread starting with the provided prompt.\n");
    b.push_str(
        "  /echo <text>:   Reply with the exact text (starts a new thread without prompt)\n",
    );
    b.push_str("  /think:         Take a short nap, then say so\n");
    b.push_str("  /help:          Prints this text\n");
    b.push('\n');
    b.push_str("Reply to any of my messages to continue the conversation.\n");
    b.push('\n');
    b.push_str("Reply only commands:\n");
    b.push_str("  /dump: Dumps out technical information about the current conversation thread\n");
    b.push_str(TWEAK_PARAM_HELP);
    b.push_str("```\n");
    b
}

#[async_trait]
impl Handler for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    async fn exec(&self, ctx: &HandlerContext, msg: Arc<Message>) -> Result<()> {
        ctx.reply(&msg, &help_text(), MessageKind::Informational)
            .await?;
        Ok(())
    }
}
