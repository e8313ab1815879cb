// ABOUTME: In-memory store of messages and threads with tree construction and id allocation.
// ABOUTME: A single mutex serialises every read and write, including parent/child linking.

use crate::error::{Error, Result};
use crate::event::ChatEvent;
use crate::identity::{MessageId, ThreadId};
use crate::message::{Message, MessageKind};
use crate::params::CompletionParameters;
use crate::thread::Thread;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Number of candidate ids tried before thread allocation fails.
pub const ID_COLLISION_RETRY_COUNT: usize = 5;

/// Source of candidate thread ids.
pub type IdGenerator = Box<dyn Fn() -> Uuid + Send + Sync>;

#[derive(Default)]
struct Store {
    threads: HashMap<ThreadId, Thread>,
    messages: HashMap<MessageId, Arc<Message>>,
    children: HashMap<MessageId, Vec<MessageId>>,
}

impl Store {
    fn allocate_thread_id(&self, generate: &IdGenerator) -> Result<ThreadId> {
        for attempt in 1..=ID_COLLISION_RETRY_COUNT {
            let candidate = ThreadId(generate());
            if !self.threads.contains_key(&candidate) {
                return Ok(candidate);
            }
            debug!(thread_id = %candidate, attempt, "Thread id collision, retrying");
        }
        Err(Error::AllocationExhausted {
            attempts: ID_COLLISION_RETRY_COUNT,
        })
    }
}

/// Concurrency-safe message and thread store.
///
/// State lives for the lifetime of the process only; lookups are consistent
/// within that lifetime and nothing is persisted.
pub struct Repository {
    store: Mutex<Store>,
    generate_id: IdGenerator,
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository {
    /// Create an empty repository using random v4 thread ids.
    pub fn new() -> Self {
        Self::with_id_generator(Uuid::new_v4)
    }

    /// Create an empty repository with a custom thread id source.
    pub fn with_id_generator(generate: impl Fn() -> Uuid + Send + Sync + 'static) -> Self {
        Self {
            store: Mutex::new(Store::default()),
            generate_id: Box::new(generate),
        }
    }

    /// Record an inbound event as a message node.
    ///
    /// Replies to a known message are attached under it and join its thread.
    /// Everything else, including replies whose parent is unknown, becomes the
    /// root of a newly allocated thread.
    pub async fn add_message(&self, event: &ChatEvent, kind: MessageKind) -> Result<Arc<Message>> {
        let id = event.message_id();
        let sender = event.sender.clone().unwrap_or_default();
        let text = event.recorded_text().to_string();

        let mut store = self.store.lock().await;

        let parent = event
            .reply_to
            .and_then(|parent_id| store.messages.get(&parent_id).cloned());

        if let (Some(parent_id), None) = (event.reply_to, &parent) {
            debug!(
                message_id = %id,
                parent_id = %parent_id,
                "Reply to unknown message, starting a new thread"
            );
        }

        let message = match parent {
            Some(parent) => {
                let message = Arc::new(Message::new(
                    id,
                    kind,
                    parent.thread_id,
                    sender,
                    text,
                    Some(Arc::clone(&parent)),
                ));
                store.children.entry(parent.id).or_default().push(id);
                message
            }
            None => {
                let thread_id = store.allocate_thread_id(&self.generate_id)?;
                let message = Arc::new(Message::new(id, kind, thread_id, sender, text, None));
                store.threads.insert(
                    thread_id,
                    Thread {
                        id: thread_id,
                        root: Arc::clone(&message),
                        settings: CompletionParameters::default(),
                    },
                );
                debug!(thread_id = %thread_id, message_id = %id, "Allocated new thread");
                message
            }
        };

        if store.messages.insert(id, Arc::clone(&message)).is_some() {
            warn!(message_id = %id, "Message id recorded twice, replacing earlier node");
        }

        Ok(message)
    }

    /// Look up a message by id.
    pub async fn get_message(&self, id: &MessageId) -> Option<Arc<Message>> {
        self.store.lock().await.messages.get(id).cloned()
    }

    /// Snapshot of a thread by id.
    pub async fn get_thread(&self, id: &ThreadId) -> Result<Thread> {
        self.store
            .lock()
            .await
            .threads
            .get(id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    /// Replace a stored thread wholesale. Last writer wins.
    pub async fn set(&self, thread: Thread) {
        self.store.lock().await.threads.insert(thread.id, thread);
    }

    /// Direct replies to a message, in arrival order.
    pub async fn children(&self, id: &MessageId) -> Vec<Arc<Message>> {
        let store = self.store.lock().await;
        store
            .children
            .get(id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|child| store.messages.get(child).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A message and every message below it, depth first.
    pub async fn subtree(&self, id: &MessageId) -> Vec<Arc<Message>> {
        let store = self.store.lock().await;
        let mut out = Vec::new();
        let mut pending = vec![*id];
        while let Some(next) = pending.pop() {
            let Some(msg) = store.messages.get(&next) else {
                continue;
            };
            out.push(Arc::clone(msg));
            if let Some(kids) = store.children.get(&next) {
                pending.extend(kids.iter().rev());
            }
        }
        out
    }

    pub async fn thread_count(&self) -> usize {
        self.store.lock().await.threads.len()
    }

    pub async fn message_count(&self) -> usize {
        self.store.lock().await.messages.len()
    }
}
