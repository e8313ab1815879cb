// ABOUTME: Integration tests for the dispatch core against in-memory collaborators.
// ABOUTME: Covers conversation flow, reply-only gating, tweak/dump commands, heartbeat and deadline.

use async_trait::async_trait;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use threadbot_core::commands::{default_registry, Prompt};
use threadbot_core::dispatch::REPLY_ONLY_NOTICE;
use threadbot_core::{
    ChatEvent, ChatTransport, CommandInvocation, CompletionBackend, CompletionRequest,
    DispatchConfig, Dispatcher, Error, Handler, HandlerContext, HandlerRegistry, Message,
    MessageId, MessageKind, Model, Outcome, Repository, Result, User,
};

// ============================================================================
// Fakes
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Sent {
    channel_id: i64,
    text: String,
    reply_to: Option<i32>,
}

struct FakeTransport {
    bot: User,
    next_number: AtomicI32,
    sent: Mutex<Vec<Sent>>,
    signals: Mutex<Vec<tokio::time::Instant>>,
}

impl FakeTransport {
    fn new() -> Self {
        Self {
            bot: User::new(999, "Bot", ""),
            next_number: AtomicI32::new(1000),
            sent: Mutex::new(Vec::new()),
            signals: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn signal_count(&self) -> usize {
        self.signals.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn send_message(
        &self,
        channel_id: i64,
        text: &str,
        reply_to: Option<i32>,
    ) -> Result<ChatEvent> {
        let number = self.next_number.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(Sent {
            channel_id,
            text: text.to_string(),
            reply_to,
        });
        Ok(ChatEvent {
            channel_id,
            message_number: number,
            sender: Some(self.bot.clone()),
            text: text.to_string(),
            command: None,
            reply_to: None,
        })
    }

    async fn signal_working(&self, _channel_id: i64) -> Result<()> {
        self.signals.lock().unwrap().push(tokio::time::Instant::now());
        Ok(())
    }

    fn bot_user(&self) -> &User {
        &self.bot
    }
}

struct FakeBackend {
    answer: String,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeBackend {
    fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for FakeBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        Ok(self.answer.clone())
    }
}

/// Counts invocations; optionally sleeps or fails.
struct Counted {
    calls: Arc<AtomicUsize>,
    reply_only: bool,
    sleep: Duration,
    fail: bool,
}

impl Counted {
    fn new(calls: Arc<AtomicUsize>) -> Self {
        Self {
            calls,
            reply_only: false,
            sleep: Duration::ZERO,
            fail: false,
        }
    }
}

#[async_trait]
impl Handler for Counted {
    fn name(&self) -> &'static str {
        "counted"
    }

    fn is_reply_only(&self) -> bool {
        self.reply_only
    }

    async fn exec(&self, _ctx: &HandlerContext, _msg: Arc<Message>) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.sleep).await;
        if self.fail {
            return Err(Error::Backend("boom".into()));
        }
        Ok(())
    }
}

struct Harness {
    dispatcher: Dispatcher,
    transport: Arc<FakeTransport>,
    backend: Arc<FakeBackend>,
    repo: Arc<Repository>,
}

fn harness(registry: HandlerRegistry, config: DispatchConfig) -> Harness {
    harness_answering(registry, config, " Why did the chicken cross the road?")
}

fn harness_answering(registry: HandlerRegistry, config: DispatchConfig, answer: &str) -> Harness {
    let transport = Arc::new(FakeTransport::new());
    let backend = Arc::new(FakeBackend::answering(answer));
    let repo = Arc::new(Repository::new());
    let ctx = HandlerContext {
        repo: Arc::clone(&repo),
        transport: transport.clone(),
        backend: backend.clone(),
    };
    Harness {
        dispatcher: Dispatcher::new(registry, ctx, config),
        transport,
        backend,
        repo,
    }
}

fn alice() -> User {
    User::new(42, "Alice", "Smith")
}

fn command(number: i32, name: &str, args: &str, reply_to: Option<MessageId>) -> ChatEvent {
    ChatEvent {
        channel_id: 7,
        message_number: number,
        sender: Some(alice()),
        text: format!("/{} {}", name, args),
        command: Some(CommandInvocation::new(name, args)),
        reply_to,
    }
}

fn reply(number: i32, text: &str, reply_to: MessageId) -> ChatEvent {
    ChatEvent {
        channel_id: 7,
        message_number: number,
        sender: Some(alice()),
        text: text.to_string(),
        command: None,
        reply_to: Some(reply_to),
    }
}

fn bot_message_id(number: i32) -> MessageId {
    MessageId::new(7, 999, number)
}

async fn run(h: &Harness, event: ChatEvent) -> Outcome {
    h.dispatcher
        .dispatch(event)
        .expect("event should be dispatched")
        .await
        .unwrap()
}

// ============================================================================
// Classification
// ============================================================================

#[tokio::test]
async fn test_unknown_command_is_dropped_before_recording() {
    let h = harness(default_registry(), DispatchConfig::default());
    assert!(h
        .dispatcher
        .dispatch(command(1, "nope", "", None))
        .is_none());
    assert_eq!(h.repo.message_count().await, 0);
}

#[tokio::test]
async fn test_plain_message_without_reply_is_ignored() {
    let h = harness(default_registry(), DispatchConfig::default());
    let event = ChatEvent {
        channel_id: 7,
        message_number: 1,
        sender: Some(alice()),
        text: "hello".to_string(),
        command: None,
        reply_to: None,
    };
    assert!(h.dispatcher.dispatch(event).is_none());
    assert_eq!(h.repo.message_count().await, 0);
}

// ============================================================================
// Reply-only gating
// ============================================================================

#[tokio::test]
async fn test_reply_only_handler_on_root_is_rejected() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut handler = Counted::new(calls.clone());
    handler.reply_only = true;
    let h = harness(
        HandlerRegistry::new(Prompt).with_command("counted", handler),
        DispatchConfig::default(),
    );

    let outcome = run(&h, command(1, "counted", "", None)).await;

    assert_eq!(outcome, Outcome::RejectedReplyOnly);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        h.transport.sent(),
        vec![Sent {
            channel_id: 7,
            text: REPLY_ONLY_NOTICE.to_string(),
            reply_to: Some(1),
        }]
    );

    // Both the rejected command and the notice are in the tree.
    let recorded = h.repo.get_message(&MessageId::new(7, 42, 1)).await.unwrap();
    assert_eq!(recorded.kind, MessageKind::Command);
    let children = h.repo.children(&recorded.id).await;
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].kind, MessageKind::Informational);
}

#[tokio::test]
async fn test_dump_on_root_is_rejected() {
    let h = harness(default_registry(), DispatchConfig::default());
    let outcome = run(&h, command(1, "dump", "", None)).await;
    assert_eq!(outcome, Outcome::RejectedReplyOnly);
    assert_eq!(h.transport.sent().len(), 1);
}

// ============================================================================
// Conversation
// ============================================================================

#[tokio::test]
async fn test_prompt_then_continue_conversation() {
    let h = harness(default_registry(), DispatchConfig::default());

    let outcome = run(&h, command(1, "prompt", "Tell me a joke", None)).await;
    assert_eq!(outcome, Outcome::Completed);

    let sent = h.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, "Why did the chicken cross the road?");
    assert_eq!(sent[0].reply_to, Some(1));

    let first = &h.backend.requests()[0];
    assert_eq!(first.prompt, "Alice Smith: Tell me a joke\n\nBot:");
    assert_eq!(first.model, Model::Davinci.as_str());
    assert_eq!(first.max_tokens, 400);
    assert!(first.stop.is_empty());

    // Reply to the bot's answer without a command.
    let outcome = run(&h, reply(2, "I don't know, why?", bot_message_id(1000))).await;
    assert_eq!(outcome, Outcome::Completed);

    let second = &h.backend.requests()[1];
    assert_eq!(
        second.prompt,
        "Alice Smith: Tell me a joke\n\n\
         Bot: Why did the chicken cross the road?\n\n\
         Alice Smith: I don't know, why?\n\n\
         Bot:"
    );

    // Every node shares the thread started by the prompt.
    let root = h.repo.get_message(&MessageId::new(7, 42, 1)).await.unwrap();
    let follow_up = h.repo.get_message(&MessageId::new(7, 42, 2)).await.unwrap();
    assert_eq!(follow_up.thread_id, root.thread_id);
    assert_eq!(follow_up.kind, MessageKind::Prompt);
    assert_eq!(h.repo.thread_count().await, 1);
    assert_eq!(h.repo.subtree(&root.id).await.len(), 4);
}

#[tokio::test]
async fn test_echo_records_command_and_replies_informational() {
    let h = harness(default_registry(), DispatchConfig::default());
    let outcome = run(&h, command(5, "echo", "hi there", None)).await;
    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(h.transport.sent()[0].text, "hi there");

    let msg = h.repo.get_message(&MessageId::new(7, 42, 5)).await.unwrap();
    assert_eq!(msg.kind, MessageKind::Command);
    assert_eq!(msg.text, "hi there");
    let children = h.repo.children(&msg.id).await;
    assert_eq!(children[0].kind, MessageKind::Informational);
    assert!(h.backend.requests().is_empty());
}

#[tokio::test]
async fn test_handler_failure_sends_nothing() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut handler = Counted::new(calls.clone());
    handler.fail = true;
    let h = harness(
        HandlerRegistry::new(Prompt).with_command("counted", handler),
        DispatchConfig::default(),
    );

    let outcome = run(&h, command(1, "counted", "", None)).await;
    assert_eq!(outcome, Outcome::Failed(Error::Backend("boom".into())));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(h.transport.sent().is_empty());
    // The audit node is still recorded.
    assert_eq!(h.repo.message_count().await, 1);
}

#[tokio::test]
async fn test_blank_completion_fails_without_reply() {
    let h = harness_answering(default_registry(), DispatchConfig::default(), " \n\t ");

    let outcome = run(&h, command(1, "prompt", "Say nothing", None)).await;
    assert_eq!(
        outcome,
        Outcome::Failed(Error::Backend("completion was empty".into()))
    );
    assert_eq!(h.backend.requests().len(), 1);
    assert!(h.transport.sent().is_empty());
    assert_eq!(h.repo.message_count().await, 1);
}

// ============================================================================
// Tweak and dump
// ============================================================================

#[tokio::test]
async fn test_tweak_updates_thread_settings() {
    let h = harness(default_registry(), DispatchConfig::default());
    run(&h, command(1, "prompt", "Tell me a joke", None)).await;

    let outcome = run(
        &h,
        command(2, "tweak", "MaxTokens=100;Temperature=0.2", Some(bot_message_id(1000))),
    )
    .await;
    assert_eq!(outcome, Outcome::Completed);

    let root = h.repo.get_message(&MessageId::new(7, 42, 1)).await.unwrap();
    let thread = h.repo.get_thread(&root.thread_id).await.unwrap();
    assert_eq!(thread.settings.max_tokens, 100);
    assert_eq!(thread.settings.temperature, 0.2);
    assert_eq!(thread.settings.top_p, 1.0);
    assert_eq!(thread.settings.model, Model::Davinci);

    // The next completion in the thread uses the new settings.
    run(&h, reply(3, "another", bot_message_id(1000))).await;
    let last = h.backend.requests().pop().unwrap();
    assert_eq!(last.max_tokens, 100);
    assert_eq!(last.temperature, 0.2);
}

#[tokio::test]
async fn test_invalid_tweak_leaves_settings_unchanged() {
    let h = harness(default_registry(), DispatchConfig::default());
    run(&h, command(1, "prompt", "Tell me a joke", None)).await;

    let outcome = run(
        &h,
        command(2, "tweak", "TopP=0.5;MaxTokens=5000", Some(bot_message_id(1000))),
    )
    .await;
    assert!(matches!(outcome, Outcome::Failed(Error::InvalidParameter(_))));

    let root = h.repo.get_message(&MessageId::new(7, 42, 1)).await.unwrap();
    let thread = h.repo.get_thread(&root.thread_id).await.unwrap();
    assert_eq!(thread.settings.max_tokens, 400);
    assert_eq!(thread.settings.top_p, 1.0);

    let usage = h.transport.sent().pop().unwrap();
    assert!(usage.text.starts_with("Incorrect usage of command"));
    assert!(usage.text.contains("PressencePenalty"));
}

#[tokio::test]
async fn test_tweak_reply_to_unknown_message_reports_missing_thread() {
    let h = harness(default_registry(), DispatchConfig::default());
    let outcome = run(
        &h,
        command(2, "tweak", "MaxTokens=100", Some(MessageId::new(7, 1, 12345))),
    )
    .await;
    assert_eq!(outcome, Outcome::Failed(Error::NotFound));
    assert!(h.transport.sent()[0]
        .text
        .starts_with("I couldn't find the thread history"));
}

#[tokio::test]
async fn test_dump_reports_thread() {
    let h = harness(default_registry(), DispatchConfig::default());
    run(&h, command(1, "prompt", "Tell me a joke", None)).await;

    let outcome = run(&h, command(2, "dump", "", Some(bot_message_id(1000)))).await;
    assert_eq!(outcome, Outcome::Completed);

    let report = h.transport.sent().pop().unwrap().text;
    assert!(report.starts_with("Thread Stats:"));
    // prompt, response and the dump command itself
    assert!(report.contains("Total messages:\t\t3\n"));
    assert!(report.contains("Total prompts:\t\t1\n"));
    assert!(report.contains("Total responses:\t\t1\n"));
    assert!(report.contains("Total commands:\t\t1\n"));
}

// ============================================================================
// Heartbeat and deadline
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_heartbeat_fires_each_interval_while_running() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut handler = Counted::new(calls.clone());
    handler.sleep = Duration::from_secs(10);
    let h = harness(
        HandlerRegistry::new(Prompt).with_command("counted", handler),
        DispatchConfig {
            deadline: Duration::from_secs(300),
            heartbeat_interval: Duration::from_secs(3),
        },
    );

    let start = tokio::time::Instant::now();
    let outcome = run(&h, command(1, "counted", "", None)).await;
    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(h.transport.signal_count(), 3);

    let signals = h.transport.signals.lock().unwrap().clone();
    for (i, at) in signals.iter().enumerate() {
        let expected = Duration::from_secs(3 * (i as u64 + 1));
        let elapsed = *at - start;
        assert!(elapsed >= expected && elapsed < expected + Duration::from_millis(100));
    }

    // Nothing fires once the frame has ended.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.transport.signal_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_cancels_handler_and_heartbeat() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut handler = Counted::new(calls.clone());
    handler.sleep = Duration::from_secs(60);
    let h = harness(
        HandlerRegistry::new(Prompt).with_command("counted", handler),
        DispatchConfig {
            deadline: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(3),
        },
    );

    let start = tokio::time::Instant::now();
    let outcome = run(&h, command(1, "counted", "", None)).await;
    assert_eq!(outcome, Outcome::TimedOut);
    let elapsed = tokio::time::Instant::now() - start;
    assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));
    assert_eq!(h.transport.signal_count(), 1);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.transport.signal_count(), 1);
    assert!(h.transport.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_fast_handler_never_signals() {
    let h = harness(default_registry(), DispatchConfig::default());
    run(&h, command(1, "echo", "quick", None)).await;
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.transport.signal_count(), 0);
}
