// ABOUTME: Library root for threadbot-core.
// ABOUTME: Exports the thread repository, tweak grammar, backend, dispatch core and commands.

pub mod backend;
pub mod commands;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod identity;
pub mod message;
pub mod params;
pub mod repository;
pub mod thread;
pub mod transport;
pub mod tweak;

pub use backend::{CompletionBackend, CompletionRequest, OpenAiBackend, OpenAiConfig};
pub use dispatch::{
    Classification, DispatchConfig, Dispatcher, Handler, HandlerContext, HandlerRegistry, Outcome,
};
pub use error::{Error, Result};
pub use event::{ChatEvent, CommandInvocation};
pub use identity::{MessageId, ThreadId, User};
pub use message::{Message, MessageKind};
pub use params::{CompletionParameters, Model};
pub use repository::Repository;
pub use thread::Thread;
pub use transport::ChatTransport;
