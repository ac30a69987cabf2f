//! HTTP error types.

use thiserror::Error;

/// Failure of an HTTP exchange.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum HttpError {
    #[error("HTTP {status} {status_text}")]
    Status { status: u16, status_text: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("request cancelled")]
    Cancelled,

    #[error("failed to decode response: {message}")]
    Decode { message: String },

    #[error("invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl HttpError {
    /// Creates a status error.
    #[must_use]
    pub fn status(status: u16, status_text: impl Into<String>) -> Self {
        Self::Status {
            status,
            status_text: status_text.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Status code, if the server answered.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a retry may succeed: network errors, timeouts and 5xx.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Cancelled | Self::Decode { .. } | Self::InvalidUrl { .. } => false,
        }
    }

    /// Whether the backend could not be reached at all.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }

    /// Whether the server rejected the credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }
}
