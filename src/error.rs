//! Error type shared by the engine, the session state machine and the game loaders.

use thiserror::Error;

use crate::session::GameStatus;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Every failure the engine can report.
///
/// Zero payouts and missing paytable entries are normal results and never surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A runtime argument is out of its valid range (non-positive bet, zero bound, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A reel strip would contain (or contains) no symbol.
    #[error("Reel strip cannot be empty")]
    EmptyStrip,
    /// Paylines, reels and visible rows do not line up.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),
    /// The requested lifecycle transition is not in the adjacency table.
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// State the session was in.
        from: GameStatus,
        /// State that was requested.
        to: GameStatus,
    },
    /// A debit larger than the current balance.
    #[error("Insufficient balance: {balance} available, {requested} requested")]
    InsufficientBalance {
        /// Balance at the time of the call.
        balance: i64,
        /// Amount that was asked for.
        requested: i64,
    },
    /// The spin provider settled with a failure.
    #[error("Spin provider failure: {0}")]
    Provider(String),
    /// A game definition or settings file is inconsistent.
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// Reading a game folder failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A par table CSV file is malformed.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// A settings file or protocol message is malformed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        EngineError::InvalidArgument(message.into())
    }
}
