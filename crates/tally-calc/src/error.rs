//! Error types for calculator operations.

/// Error type for calculator operations.
///
/// A failed call never changes the calculator; callers re-render the
/// unchanged display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Token or display text the calculator cannot act on.
    #[error("Unsupported input: {0}")]
    Unsupported(String),

    /// Division or modulo with a zero divisor.
    #[error("Unsupported divide by zero")]
    DivisionByZero,
}

/// Result type for calculator operations.
pub type Result<T> = std::result::Result<T, Error>;
