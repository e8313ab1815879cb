// ABOUTME: /think command: waits, then posts a standalone message.
// ABOUTME: Useful for exercising the heartbeat indicator by hand.

use crate::dispatch::{Handler, HandlerContext};
use crate::error::Result;
use crate::message::Message;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub struct Think {
    pub pause: Duration,
}

impl Default for Think {
    fn default() -> Self {
        Self {
            pause: Duration::from_secs(5),
        }
    }
}

#[async_trait]
impl Handler for Think {
    fn name(&self) -> &'static str {
        "think"
    }

    async fn exec(&self, ctx: &HandlerContext, msg: Arc<Message>) -> Result<()> {
        tokio::time::sleep(self.pause).await;
        ctx.transport
            .send_message(msg.id.channel_id, "had a good sleep", None)
            .await?;
        Ok(())
    }
}
