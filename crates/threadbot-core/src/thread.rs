// ABOUTME: Conversation thread: a root message plus its completion settings.
// ABOUTME: Fetched threads are snapshots; settings changes are written back wholesale.

use crate::identity::ThreadId;
use crate::message::Message;
use crate::params::CompletionParameters;
use std::sync::Arc;

/// A tree of messages sharing one root and one configuration set.
#[derive(Debug, Clone)]
pub struct Thread {
    pub id: ThreadId,
    pub root: Arc<Message>,
    pub settings: CompletionParameters,
}

impl Thread {
    /// Copy of this thread with the settings replaced.
    pub fn with_settings(&self, settings: CompletionParameters) -> Self {
        Self {
            id: self.id,
            root: Arc::clone(&self.root),
            settings,
        }
    }
}
