// ABOUTME: Built-in command handlers and the default registry.
// ABOUTME: prompt/continue, echo, think, dump, tweak and help.

mod dump;
mod echo;
mod help;
mod prompt;
mod think;
mod tweak;

pub use dump::{build_report, Dump};
pub use echo::Echo;
pub use help::{help_text, Help};
pub use prompt::Prompt;
pub use think::Think;
pub use tweak::Tweak;

use crate::dispatch::HandlerRegistry;

/// Sent when a reply-only command cannot locate its thread.
pub const THREAD_NOT_FOUND_NOTICE: &str = concat!(
    "I couldn't find the thread history. ",
    "I only keep a small sample of data around for future use, sorry 💩"
);

/// Registry with every built-in command; plain replies continue the conversation.
pub fn default_registry() -> HandlerRegistry {
    HandlerRegistry::new(Prompt)
        .with_command("prompt", Prompt)
        .with_command("echo", Echo)
        .with_command("think", Think::default())
        .with_command("dump", Dump)
        .with_command("tweak", Tweak)
        .with_command("help", Help)
}
