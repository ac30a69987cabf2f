//! Authentication error types.

use thiserror::Error;

use super::HttpError;

/// Authentication error variants.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum AuthError {
    #[error("invalid token format: {reason}")]
    InvalidTokenFormat { reason: String },

    #[error("credentials rejected: {message}")]
    Rejected { message: String },

    #[error("failed to retrieve stored token: {message}")]
    TokenRetrievalFailed { message: String },

    #[error("failed to store token: {message}")]
    TokenStorageFailed { message: String },

    #[error("no authentication token available")]
    NoTokenAvailable,

    #[error(transparent)]
    Http(#[from] HttpError),
}

impl AuthError {
    /// Creates invalid format error.
    #[must_use]
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidTokenFormat {
            reason: reason.into(),
        }
    }

    /// Creates rejected error.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Creates retrieval failed error.
    #[must_use]
    pub fn retrieval_failed(message: impl Into<String>) -> Self {
        Self::TokenRetrievalFailed {
            message: message.into(),
        }
    }

    /// Creates storage failed error.
    #[must_use]
    pub fn storage_failed(message: impl Into<String>) -> Self {
        Self::TokenStorageFailed {
            message: message.into(),
        }
    }

    /// Returns whether error is network related.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_unreachable())
    }
}
