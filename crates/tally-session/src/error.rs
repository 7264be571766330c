//! Error types for session store operations.

use std::time::Duration;

/// Error type for session store lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The drain deadline passed while sessions were still live.
    #[error("Shutdown timed out after {waited:?} with {remaining} live sessions")]
    Timeout { waited: Duration, remaining: usize },

    /// The drain was cancelled while sessions were still live.
    #[error("Shutdown cancelled with {remaining} live sessions")]
    Cancelled { remaining: usize },

    /// The store was already closed or fully drained.
    #[error("Session store already closed")]
    AlreadyClosed,
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, Error>;
