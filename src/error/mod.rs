//! Error types for the session library.

use thiserror::Error;

/// Primary error type for configuration, wiring and CLI-level operations.
///
/// Auth flows report [`crate::auth::AuthError`]; it converts into this type
/// at the boundary.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Session closed")]
    SessionClosed,
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SessionError>;
