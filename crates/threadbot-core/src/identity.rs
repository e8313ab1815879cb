// ABOUTME: Value types identifying messages, threads and senders.
// ABOUTME: MessageId is the composite (channel, sender, message number) key used by the repository.

use std::fmt;
use uuid::Uuid;

/// Composite identity of a chat message.
///
/// Two inbound events with the same triple are the same logical message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MessageId {
    pub channel_id: i64,
    pub sender_id: i64,
    pub message_number: i32,
}

impl MessageId {
    pub fn new(channel_id: i64, sender_id: i64, message_number: i32) -> Self {
        Self {
            channel_id,
            sender_id,
            message_number,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.channel_id, self.sender_id, self.message_number
        )
    }
}

/// Opaque unique thread identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(pub Uuid);

impl ThreadId {
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for ThreadId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A chat participant, either a human or the bot itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: Option<String>,
}

impl User {
    pub fn new(id: i64, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            username: None,
        }
    }

    /// First name, followed by the last name when there is one.
    pub fn display_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}
