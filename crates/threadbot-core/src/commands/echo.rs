// ABOUTME: /echo command: replies with its own argument text.

use crate::dispatch::{Handler, HandlerContext};
use crate::error::Result;
use crate::message::{Message, MessageKind};
use async_trait::async_trait;
use std::sync::Arc;

pub struct Echo;

#[async_trait]
impl Handler for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn exec(&self, ctx: &HandlerContext, msg: Arc<Message>) -> Result<()> {
        ctx.reply(&msg, &msg.text, MessageKind::Informational).await?;
        Ok(())
    }
}
