use thiserror::Error;

use crate::error::SessionError;

/// Normalized authentication errors across the remote endpoints and the
/// session store.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Credentials rejected (status {status})")]
    Rejected { status: u16 },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Server error (status {status})")]
    Server { status: u16 },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Returns true for failures that say nothing about the credentials
    /// themselves: transport problems, timeouts and 5xx responses.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout | Self::Server { .. }
        )
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout;
        }
        if error.is_decode() {
            return Self::InvalidResponse(error.to_string());
        }
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<AuthError> for SessionError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Io(message) => SessionError::Storage(message),
            other => SessionError::Authentication(other.to_string()),
        }
    }
}
