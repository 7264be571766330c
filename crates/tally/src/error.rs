//! Error types for calculator sessions.

/// Error type for calculator session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No live session for the key; it must be opened (again).
    #[error("Session expired: {0}")]
    Expired(String),

    /// A live session already exists for the key.
    #[error("Session still active: {0}")]
    Active(String),

    /// The store is draining or stopped and admits no new sessions.
    #[error("Not accepting new sessions")]
    ShuttingDown,

    /// The stored payload is not a calculator.
    #[error("Session {0} does not hold a calculator")]
    PayloadMismatch(String),

    /// The calculator rejected the token.
    #[error("Calculator error: {0}")]
    Calc(#[from] tally_calc::Error),

    /// Store lifecycle error.
    #[error("Store error: {0}")]
    Store(#[from] tally_session::Error),
}

/// Result type for calculator session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
