// ABOUTME: Message tree node and conversation history reconstruction.
// ABOUTME: Nodes link upward to their parent; children are tracked by the repository.

use crate::identity::{MessageId, ThreadId, User};
use std::sync::Arc;

/// Classification of a node; decides whether it is replayed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Prompt,
    Response,
    Informational,
    Command,
}

impl MessageKind {
    /// Whether nodes of this kind are part of the conversation sent to the backend.
    pub fn is_conversational(self) -> bool {
        matches!(self, MessageKind::Prompt | MessageKind::Response)
    }
}

/// A node of a conversation thread.
///
/// Created once by the repository and immutable afterwards. The parent link is
/// fixed at creation and always points at an earlier node, so walking it
/// terminates at the thread root.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub kind: MessageKind,
    pub thread_id: ThreadId,
    pub sender: User,
    pub text: String,
    parent: Option<Arc<Message>>,
}

impl Message {
    pub fn new(
        id: MessageId,
        kind: MessageKind,
        thread_id: ThreadId,
        sender: User,
        text: impl Into<String>,
        parent: Option<Arc<Message>>,
    ) -> Self {
        Self {
            id,
            kind,
            thread_id,
            sender,
            text: text.into(),
            parent,
        }
    }

    pub fn parent(&self) -> Option<&Arc<Message>> {
        self.parent.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Ancestry from the thread root down to this message, inclusive.
    pub fn ancestry(&self) -> Vec<&Message> {
        let mut chain = vec![self];
        let mut current = self.parent.as_deref();
        while let Some(msg) = current {
            chain.push(msg);
            current = msg.parent.as_deref();
        }
        chain.reverse();
        chain
    }

    /// Conversation history as `"<sender>: <text>"` lines, oldest first.
    ///
    /// Informational and command nodes are walked for ancestry but left out.
    pub fn history(&self) -> Vec<String> {
        self.ancestry()
            .into_iter()
            .filter(|msg| msg.kind.is_conversational())
            .map(|msg| format!("{}: {}", msg.sender.display_name(), msg.text))
            .collect()
    }
}
