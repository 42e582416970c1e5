use std::io;

/// Errors surfaced by the session core and its stores
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid snapshot: score {score}, time left {time_left}s (session is {session_secs}s)")]
    InvalidSnapshot {
        score: i64,
        time_left: i64,
        session_secs: u32,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
