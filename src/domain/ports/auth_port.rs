//! Authentication port definition.

use async_trait::async_trait;

use crate::domain::entities::{AuthResponse, AuthToken, Credentials, UserProfile};
use crate::domain::errors::AuthError;

/// Port for the gallery backend's auth endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthPort: Send + Sync {
    /// Exchanges credentials for a token.
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError>;

    /// Creates an account.
    async fn register(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError>;

    /// Ends the server-side session and drops the active token.
    async fn logout(&self) -> Result<(), AuthError>;

    /// Fetches the profile belonging to the active token.
    async fn current_user(&self) -> Result<UserProfile, AuthError>;

    /// Replaces the token attached to outgoing requests.
    fn activate_token(&self, token: Option<AuthToken>);
}
