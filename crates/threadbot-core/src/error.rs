// ABOUTME: Error types for threadbot-core.
// ABOUTME: Covers repository lookups, id allocation, tweak validation, reply gating and collaborators.

use std::time::Duration;
use thiserror::Error;

/// Error types for the thread repository and dispatch core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Thread or message lookup miss.
    #[error("could not find element")]
    NotFound,

    /// Every candidate thread id collided with an existing thread.
    #[error("failed to allocate thread after {attempts} attempts")]
    AllocationExhausted { attempts: usize },

    /// Tweak grammar or bounds violation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A reply-only handler was invoked without reply context.
    #[error("command requires a reply to an existing message")]
    ReplyOnlyViolation,

    /// Completion backend call failed.
    #[error("completion backend error: {0}")]
    Backend(String),

    /// Chat transport call failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Handler exceeded the execution deadline.
    #[error("handler timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type alias using the core Error.
pub type Result<T> = std::result::Result<T, Error>;
