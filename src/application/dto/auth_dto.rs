//! Authentication DTOs.

use crate::domain::entities::{Credentials, UserProfile};

/// Source of the authentication token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Token from the command line or `CAROUSEL_TOKEN`.
    CommandLine,
    /// Token from system keyring.
    Keyring,
}

impl TokenSource {
    /// Returns human-readable description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::CommandLine => "command line / environment",
            Self::Keyring => "system keyring",
        }
    }
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Login request data.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// Email and password.
    pub credentials: Credentials,
    /// Whether to persist token.
    pub persist_token: bool,
}

impl LoginRequest {
    /// Creates new login request.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Credentials {
                email: email.into(),
                password: password.into(),
                username: None,
            },
            persist_token: true,
        }
    }

    /// Sets the display name, for registration.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.credentials.username = Some(username.into());
        self
    }

    /// Disables token persistence.
    #[must_use]
    pub const fn without_persistence(mut self) -> Self {
        self.persist_token = false;
        self
    }
}

/// Login response data.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    /// Authenticated user, when the backend returned one.
    pub user: Option<UserProfile>,
    /// Server message.
    pub message: Option<String>,
    /// Whether a token was issued.
    pub token_issued: bool,
    /// Whether token was persisted.
    pub token_persisted: bool,
}
