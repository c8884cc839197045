//! Error types for pixshare.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

use crate::http::refresh::{RefreshFailure, RefreshFailureKind};

/// Primary error type for all pixshare operations.
#[derive(Error, Debug)]
pub enum PixshareError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(
        "API error (status {status}): {}",
        .message.as_deref().unwrap_or("request failed")
    )]
    Api {
        status: u16,
        /// Message reported by the server, if any.
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Token refresh failed: {0}")]
    Refresh(RefreshFailure),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl PixshareError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: Some(message.into()),
        }
    }

    /// Fill in a user-facing message when the server did not send one.
    pub fn with_fallback(self, fallback: &str) -> Self {
        match self {
            Self::Api {
                status,
                message: None,
            } => Self::Api {
                status,
                message: Some(fallback.to_string()),
            },
            other => other,
        }
    }

    /// HTTP status carried by this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Refresh(failure) => match failure.kind {
                RefreshFailureKind::Credential => ErrorCategory::Authentication,
                RefreshFailureKind::Transient => ErrorCategory::Network,
            },
            Self::Network(e) if e.is_timeout() => ErrorCategory::Timeout,
            Self::Network(_) => ErrorCategory::Network,
            Self::Io(_) => ErrorCategory::Storage,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                404 => ErrorCategory::NotFound,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::InvalidArgument(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Timeout | ErrorCategory::Server
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::LogIn,
            ErrorCategory::Network | ErrorCategory::Timeout | ErrorCategory::Server => {
                RecoverySuggestion::RetryWithBackoff
            }
            ErrorCategory::Configuration | ErrorCategory::Storage => {
                RecoverySuggestion::CheckConfiguration
            }
            ErrorCategory::Api | ErrorCategory::NotFound => RecoverySuggestion::CheckInput,
            _ => RecoverySuggestion::None,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PixshareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_status() {
        let err = PixshareError::api(404, "Image not found");
        assert_eq!(err.to_string(), "API error (status 404): Image not found");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn fallback_only_fills_missing_message() {
        let bare = PixshareError::Api {
            status: 500,
            message: None,
        };
        assert_eq!(
            bare.with_fallback("Failed to fetch images").to_string(),
            "API error (status 500): Failed to fetch images"
        );
        let told = PixshareError::api(500, "database offline").with_fallback("Failed to fetch images");
        assert_eq!(told.to_string(), "API error (status 500): database offline");
    }

    #[test]
    fn unauthorized_api_error_suggests_login() {
        let err = PixshareError::api(401, "Unauthorized");
        assert_eq!(err.category(), ErrorCategory::Authentication);
        assert_eq!(err.recovery_suggestion(), RecoverySuggestion::LogIn);
        assert!(!err.is_retryable());
    }

    #[test]
    fn refresh_failures_split_by_kind() {
        let credential = PixshareError::Refresh(RefreshFailure::credential("refresh token rejected"));
        let transient = PixshareError::Refresh(RefreshFailure::transient("connection reset"));
        assert_eq!(credential.category(), ErrorCategory::Authentication);
        assert_eq!(transient.category(), ErrorCategory::Network);
        assert!(transient.is_retryable());
        assert!(!credential.is_retryable());
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(PixshareError::api(503, "down").is_retryable());
        assert!(!PixshareError::api(400, "bad").is_retryable());
    }
}
