// ABOUTME: Per-event dispatch: classify, record, gate reply-only handlers, execute under a deadline.
// ABOUTME: A heartbeat task re-signals "working" while the handler runs, sharing one cancellation scope.

use crate::backend::CompletionBackend;
use crate::error::{Error, Result};
use crate::event::ChatEvent;
use crate::message::{Message, MessageKind};
use crate::repository::Repository;
use crate::transport::ChatTransport;
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Overall time budget for one handler execution.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5 * 60);

/// Time between "working" signals while a handler runs.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(3);

pub const REPLY_ONLY_NOTICE: &str = concat!(
    "That command can only be used in the context of a thread, ",
    "try replying to an existing message."
);

/// How an inbound event is routed, decided once per event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Explicit command, looked up in the registry by name.
    Command { name: String },
    /// Plain reply to an earlier message; continues the conversation.
    ContinueConversation,
    /// Neither a command nor a reply.
    Ignored,
}

impl Classification {
    pub fn of(event: &ChatEvent) -> Self {
        match (&event.command, event.reply_to) {
            (Some(cmd), _) => Classification::Command {
                name: cmd.name.clone(),
            },
            (None, Some(_)) => Classification::ContinueConversation,
            (None, None) => Classification::Ignored,
        }
    }
}

/// A unit of work triggered by an inbound event.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Whether the triggering event must be a reply to an existing message.
    fn is_reply_only(&self) -> bool {
        false
    }

    /// Kind the triggering message is recorded as when invoked as a command.
    fn records_as(&self) -> MessageKind {
        MessageKind::Command
    }

    async fn exec(&self, ctx: &HandlerContext, msg: Arc<Message>) -> Result<()>;
}

/// Command name to handler mapping, built at startup.
#[derive(Clone)]
pub struct HandlerRegistry {
    commands: HashMap<String, Arc<dyn Handler>>,
    conversation: Arc<dyn Handler>,
}

impl HandlerRegistry {
    /// Registry with only the handler used for plain replies.
    pub fn new(conversation: impl Handler + 'static) -> Self {
        Self {
            commands: HashMap::new(),
            conversation: Arc::new(conversation),
        }
    }

    pub fn with_command(
        mut self,
        name: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> Self {
        self.commands.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn command(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.commands.get(name).cloned()
    }

    pub fn conversation(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.conversation)
    }

    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Shared collaborators handed to every handler.
#[derive(Clone)]
pub struct HandlerContext {
    pub repo: Arc<Repository>,
    pub transport: Arc<dyn ChatTransport>,
    pub backend: Arc<dyn CompletionBackend>,
}

impl HandlerContext {
    /// Send `text` as a reply to `msg` and record the sent message under it.
    pub async fn reply(
        &self,
        msg: &Message,
        text: &str,
        kind: MessageKind,
    ) -> Result<Arc<Message>> {
        let mut sent = self
            .transport
            .send_message(msg.id.channel_id, text, Some(msg.id.message_number))
            .await?;
        sent.reply_to = Some(msg.id);
        self.repo.add_message(&sent, kind).await
    }
}

/// Timing of the execution frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    pub deadline: Duration,
    pub heartbeat_interval: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

/// Terminal state of one dispatched event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed,
    Failed(Error),
    TimedOut,
    /// Reply-only handler invoked without reply context; handler never ran.
    RejectedReplyOnly,
    /// The event could not be recorded.
    Dropped(Error),
}

/// Routes inbound events to handlers.
pub struct Dispatcher {
    registry: HandlerRegistry,
    ctx: HandlerContext,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, ctx: HandlerContext, config: DispatchConfig) -> Self {
        Self {
            registry,
            ctx,
            config,
        }
    }

    /// Pick the handler for an event and the kind its message is recorded as.
    /// Returns None for events that should be dropped.
    pub fn resolve(&self, event: &ChatEvent) -> Option<(Arc<dyn Handler>, MessageKind)> {
        match Classification::of(event) {
            Classification::Command { name } => match self.registry.command(&name) {
                Some(handler) => {
                    let kind = handler.records_as();
                    Some((handler, kind))
                }
                None => {
                    info!(command = %name, "Skipping command, no handler registered");
                    None
                }
            },
            Classification::ContinueConversation => {
                Some((self.registry.conversation(), MessageKind::Prompt))
            }
            Classification::Ignored => {
                debug!(
                    channel_id = event.channel_id,
                    message_number = event.message_number,
                    "Ignoring event that is neither a command nor a reply"
                );
                None
            }
        }
    }

    /// Start processing an event in the background.
    ///
    /// Returns immediately; the handle resolves once the handler and its
    /// heartbeat have both finished.
    pub fn dispatch(&self, event: ChatEvent) -> Option<JoinHandle<Outcome>> {
        let (handler, kind) = self.resolve(&event)?;
        let ctx = self.ctx.clone();
        let config = self.config;
        Some(tokio::spawn(async move {
            process(ctx, handler, kind, event, config).await
        }))
    }
}

/// Record the event, apply the reply-only gate and run the handler.
pub async fn process(
    ctx: HandlerContext,
    handler: Arc<dyn Handler>,
    kind: MessageKind,
    event: ChatEvent,
    config: DispatchConfig,
) -> Outcome {
    let sender = event
        .sender
        .as_ref()
        .map(|u| u.display_name())
        .unwrap_or_default();
    info!(
        handler = handler.name(),
        sender = %sender,
        channel_id = event.channel_id,
        "Handling event"
    );

    let msg = match ctx.repo.add_message(&event, kind).await {
        Ok(msg) => msg,
        Err(e) => {
            error!(
                error = %e,
                handler = handler.name(),
                "Failed to record message, dropping event"
            );
            return Outcome::Dropped(e);
        }
    };

    if handler.is_reply_only() && !event.is_reply() {
        warn!(
            handler = handler.name(),
            error = %Error::ReplyOnlyViolation,
            "Reply-only command used outside a thread"
        );
        if let Err(e) = ctx.reply(&msg, REPLY_ONLY_NOTICE, MessageKind::Informational).await {
            error!(error = %e, "Failed to send reply-only notice");
        }
        return Outcome::RejectedReplyOnly;
    }

    let channel_id = msg.id.channel_id;
    let result = run_with_heartbeat(
        Arc::clone(&ctx.transport),
        channel_id,
        config,
        handler.exec(&ctx, msg),
    )
    .await;

    match result {
        Ok(()) => {
            debug!(handler = handler.name(), "Handler completed");
            Outcome::Completed
        }
        Err(Error::Timeout(after)) => {
            warn!(handler = handler.name(), after = ?after, "Handler timed out");
            Outcome::TimedOut
        }
        Err(e) => {
            error!(handler = handler.name(), error = %e, "Error in handler");
            Outcome::Failed(e)
        }
    }
}

/// Run `work` under the configured deadline while a sibling task emits
/// heartbeats. The heartbeat is stopped and joined before this returns.
pub async fn run_with_heartbeat<F, T>(
    transport: Arc<dyn ChatTransport>,
    channel_id: i64,
    config: DispatchConfig,
    work: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let scope = CancellationToken::new();
    let guard = scope.clone().drop_guard();
    let beats = tokio::spawn(heartbeat(
        transport,
        channel_id,
        config.heartbeat_interval,
        scope.child_token(),
    ));

    let result = tokio::time::timeout(config.deadline, work).await;
    drop(guard);

    match beats.await {
        Ok(count) => debug!(channel_id, beats = count, "Heartbeat stopped"),
        Err(e) => warn!(channel_id, error = %e, "Heartbeat task failed"),
    }

    result.unwrap_or(Err(Error::Timeout(config.deadline)))
}

/// Signal "working" every `period` until cancelled. Returns the number of signals sent.
async fn heartbeat(
    transport: Arc<dyn ChatTransport>,
    channel_id: i64,
    period: Duration,
    cancel: CancellationToken,
) -> u32 {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut count = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            res = transport.signal_working(channel_id) => {
                count += 1;
                if let Err(e) = res {
                    warn!(channel_id, error = %e, "Failed to set typing status");
                }
            }
        }
    }

    count
}
