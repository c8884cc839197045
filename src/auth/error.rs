use thiserror::Error;

use crate::error::PixshareError;

/// Errors raised by token persistence and credential handling.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
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

impl From<AuthError> for PixshareError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Io(message) => PixshareError::Io(std::io::Error::other(message)),
            other => PixshareError::Authentication(other.to_string()),
        }
    }
}
