// ABOUTME: /tweak command: changes a thread's completion settings.
// ABOUTME: Reply-only; invalid input leaves the stored settings untouched.

use super::THREAD_NOT_FOUND_NOTICE;
use crate::dispatch::{Handler, HandlerContext};
use crate::error::{Error, Result};
use crate::message::{Message, MessageKind};
use crate::tweak::{self, TWEAK_PARAM_HELP};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub struct Tweak;

#[async_trait]
impl Handler for Tweak {
    fn name(&self) -> &'static str {
        "tweak"
    }

    fn is_reply_only(&self) -> bool {
        true
    }

    async fn exec(&self, ctx: &HandlerContext, msg: Arc<Message>) -> Result<()> {
        if msg.is_root() {
            ctx.reply(&msg, THREAD_NOT_FOUND_NOTICE, MessageKind::Informational)
                .await?;
            return Err(Error::NotFound);
        }

        let thread = match ctx.repo.get_thread(&msg.thread_id).await {
            Ok(thread) => thread,
            Err(e) => {
                ctx.reply(&msg, THREAD_NOT_FOUND_NOTICE, MessageKind::Informational)
                    .await?;
                return Err(e);
            }
        };

        let settings = match tweak::apply(&thread.settings, &msg.text) {
            Ok(settings) => settings,
            Err(e) => {
                let usage = format!(
                    "Incorrect usage of command, the correct syntax is {}",
                    TWEAK_PARAM_HELP
                );
                ctx.reply(&msg, &usage, MessageKind::Informational).await?;
                return Err(e);
            }
        };

        info!(thread_id = %thread.id, settings = ?settings, "Thread settings updated");
        ctx.repo.set(thread.with_settings(settings)).await;
        Ok(())
    }
}
