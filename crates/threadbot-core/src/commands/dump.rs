// ABOUTME: /dump command: reports message counts and completion settings for a thread.
// ABOUTME: Reply-only; walks the whole tree under the thread root.

use super::THREAD_NOT_FOUND_NOTICE;
use crate::dispatch::{Handler, HandlerContext};
use crate::error::{Error, Result};
use crate::message::{Message, MessageKind};
use crate::thread::Thread;
use async_trait::async_trait;
use std::fmt::Write;
use std::sync::Arc;

pub struct Dump;

fn count(messages: &[Arc<Message>], kind: Option<MessageKind>) -> usize {
    messages
        .iter()
        .filter(|m| kind.map_or(true, |k| m.kind == k))
        .count()
}

/// Render the statistics report for a thread given every message in it.
pub fn build_report(thread: &Thread, messages: &[Arc<Message>]) -> String {
    let s = &thread.settings;
    let mut b = String::new();
    let _ = writeln!(b, "Thread Stats:");
    let _ = writeln!(b, "  Thread ID: {}", thread.id);
    let _ = writeln!(b, "    Total messages:\t\t{}", count(messages, None));
    let _ = writeln!(
        b,
        "    Total prompts:\t\t{}",
        count(messages, Some(MessageKind::Prompt))
    );
    let _ = writeln!(
        b,
        "    Total responses:\t\t{}",
        count(messages, Some(MessageKind::Response))
    );
    let _ = writeln!(
        b,
        "    Total commands:\t\t{}",
        count(messages, Some(MessageKind::Command))
    );
    let _ = writeln!(
        b,
        "    Total informational:\t\t{}",
        count(messages, Some(MessageKind::Informational))
    );
    let _ = writeln!(b);
    let _ = writeln!(b, "Thread Completion Parameters:");
    let _ = writeln!(b, "    Model:\t\t{}", s.model);
    let _ = writeln!(b, "    MaxTokens:\t\t{}", s.max_tokens);
    let _ = writeln!(b, "    FrequencyPenalty:\t\t{:.6}", s.frequency_penalty);
    let _ = writeln!(b, "    PressencePenalty:\t\t{:.6}", s.presence_penalty);
    let _ = writeln!(b, "    Temperature:\t\t{:.6}", s.temperature);
    let _ = writeln!(b, "    TopP:\t\t{:.6}", s.top_p);
    b
}

#[async_trait]
impl Handler for Dump {
    fn name(&self) -> &'static str {
        "dump"
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

        let messages = ctx.repo.subtree(&thread.root.id).await;
        ctx.reply(&msg, &build_report(&thread, &messages), MessageKind::Informational)
            .await?;
        Ok(())
    }
}
