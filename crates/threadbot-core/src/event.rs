// ABOUTME: Transport-independent representation of an inbound chat event.
// ABOUTME: Carries sender, channel, message number, raw text, optional command and reply reference.

use crate::identity::{MessageId, User};

/// A command invocation parsed from message text, e.g. `/tweak MaxTokens=100`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub name: String,
    pub arguments: String,
}

impl CommandInvocation {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// An inbound message as delivered by the chat transport.
///
/// Messages the bot sends are echoed back by the transport in this same shape so
/// they can be recorded into the thread tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEvent {
    pub channel_id: i64,
    pub message_number: i32,
    pub sender: Option<User>,
    pub text: String,
    pub command: Option<CommandInvocation>,
    /// Identity of the message this one replies to.
    pub reply_to: Option<MessageId>,
}

impl ChatEvent {
    /// Derive the repository key for this event. A missing sender maps to id 0.
    pub fn message_id(&self) -> MessageId {
        MessageId {
            channel_id: self.channel_id,
            sender_id: self.sender.as_ref().map(|u| u.id).unwrap_or_default(),
            message_number: self.message_number,
        }
    }

    /// Text that is stored on the message node: command arguments for commands,
    /// the raw text otherwise.
    pub fn recorded_text(&self) -> &str {
        match &self.command {
            Some(cmd) => &cmd.arguments,
            None => &self.text,
        }
    }

    pub fn is_command(&self) -> bool {
        self.command.is_some()
    }

    pub fn is_reply(&self) -> bool {
        self.reply_to.is_some()
    }
}
