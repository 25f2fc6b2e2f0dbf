use thiserror::Error;

/// Errors surfaced by the library. Gameplay misuse (early or repeated match
/// signals) is not an error and never produces one of these.
#[derive(Error, Debug)]
pub enum NbackError {
    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    #[error("a session is running; settings can only change between sessions")]
    SessionRunning,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NbackError>;
