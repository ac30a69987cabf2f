//! Token storage port definition.

use async_trait::async_trait;

use crate::domain::entities::AuthToken;
use crate::domain::errors::AuthError;

/// Port for persisting the bearer token between sessions.
#[async_trait]
pub trait TokenStoragePort: Send + Sync {
    /// Retrieves stored token.
    async fn get_token(&self) -> Result<Option<AuthToken>, AuthError>;

    /// Stores token securely.
    async fn store_token(&self, token: &AuthToken) -> Result<(), AuthError>;

    /// Deletes stored token. Deleting a missing token succeeds.
    async fn delete_token(&self) -> Result<(), AuthError>;

    /// Checks if token exists.
    async fn has_token(&self) -> Result<bool, AuthError> {
        Ok(self.get_token().await?.is_some())
    }
}

/// In-memory storage, used when no keyring is wanted and in tests.
#[derive(Default)]
pub struct MemoryTokenStorage {
    token: tokio::sync::RwLock<Option<AuthToken>>,
}

impl MemoryTokenStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage holding `token`.
    #[must_use]
    pub fn with_token(token: AuthToken) -> Self {
        Self {
            token: tokio::sync::RwLock::new(Some(token)),
        }
    }
}

#[async_trait]
impl TokenStoragePort for MemoryTokenStorage {
    async fn get_token(&self) -> Result<Option<AuthToken>, AuthError> {
        Ok(self.token.read().await.clone())
    }

    async fn store_token(&self, token: &AuthToken) -> Result<(), AuthError> {
        *self.token.write().await = Some(token.clone());
        Ok(())
    }

    async fn delete_token(&self) -> Result<(), AuthError> {
        *self.token.write().await = None;
        Ok(())
    }
}
