// ABOUTME: Chat transport trait consumed by the dispatch core.
// ABOUTME: Implemented by the Telegram adapter and by in-memory fakes in tests.

use crate::error::Result;
use crate::event::ChatEvent;
use crate::identity::User;
use async_trait::async_trait;

/// Send-side primitives of a chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `text` to a channel, optionally as a reply to a message number.
    ///
    /// Returns the sent message in inbound-event form so it can be recorded.
    async fn send_message(
        &self,
        channel_id: i64,
        text: &str,
        reply_to: Option<i32>,
    ) -> Result<ChatEvent>;

    /// Show a transient "working" indicator in the channel.
    async fn signal_working(&self, channel_id: i64) -> Result<()>;

    /// The bot's own identity.
    fn bot_user(&self) -> &User;
}
