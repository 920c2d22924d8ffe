use thiserror::Error;

/// Errors raised while recording or replaying moves.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid move notation: {0}")]
    InvalidNotation(String),

    #[error("Illegal move {mv} in position {fen}")]
    IllegalMove { mv: String, fen: String },

    #[error("Ambiguous move {mv} in position {fen}")]
    AmbiguousMove { mv: String, fen: String },

    #[error("Invalid FEN {fen}: {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("PGN error at move {ply}: {reason}")]
    Pgn { ply: usize, reason: String },

    #[error("Move index {index} out of range (history has {len} moves)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Waiting for the engine's move")]
    AwaitingEngine,
}

/// Errors raised while talking to the analysis backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid backend response: {0}")]
    Decode(#[from] serde_json::Error),
}
