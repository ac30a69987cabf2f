//! Keyring-based token storage.

use async_trait::async_trait;
use keyring::Entry;
use reqwest::Url;
use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::domain::entities::AuthToken;
use crate::domain::errors::AuthError;
use crate::domain::ports::TokenStoragePort;

const KEYRING_SERVICE: &str = "carousel";
const KEYRING_USER: &str = "token";

/// Keeps the bearer token in the system keyring.
pub struct KeyringTokenStorage {
    service: String,
    user: String,
}

impl KeyringTokenStorage {
    /// Creates storage under the `carousel` service.
    #[must_use]
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
            user: KEYRING_USER.to_string(),
        }
    }

    /// Creates storage keyed to one backend, so tokens for different
    /// servers do not overwrite each other.
    ///
    /// Falls back to the plain entry when `api_url` has no host.
    #[must_use]
    pub fn for_backend(api_url: &str) -> Self {
        let user = Url::parse(api_url)
            .ok()
            .and_then(|url| {
                let host = url.host_str()?.to_string();
                Some(match url.port() {
                    Some(port) => format!("{KEYRING_USER}@{host}:{port}"),
                    None => format!("{KEYRING_USER}@{host}"),
                })
            })
            .unwrap_or_else(|| KEYRING_USER.to_string());
        Self::with_names(KEYRING_SERVICE, user)
    }

    /// Creates storage with custom names.
    #[must_use]
    pub fn with_names(service: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            user: user.into(),
        }
    }

    fn entry(&self) -> Result<Entry, AuthError> {
        Entry::new(&self.service, &self.user)
            .map_err(|e| AuthError::retrieval_failed(format!("failed to access keyring: {e}")))
    }
}

impl Default for KeyringTokenStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStoragePort for KeyringTokenStorage {
    async fn get_token(&self) -> Result<Option<AuthToken>, AuthError> {
        debug!(service = %self.service, "Retrieving token from keyring");

        let entry = self.entry()?;

        match entry.get_password() {
            Ok(mut password) => {
                debug!("Token found in keyring");
                let token = AuthToken::new(&password);
                password.zeroize();
                Ok(token)
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No token stored in keyring");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "Failed to retrieve token from keyring");
                Err(AuthError::retrieval_failed(e.to_string()))
            }
        }
    }

    async fn store_token(&self, token: &AuthToken) -> Result<(), AuthError> {
        debug!(service = %self.service, "Storing token in keyring");

        let entry = self.entry()?;

        entry.set_password(token.as_str()).map_err(|e| {
            warn!(error = %e, "Failed to store token in keyring");
            AuthError::storage_failed(e.to_string())
        })?;

        debug!("Token stored successfully");
        Ok(())
    }

    async fn delete_token(&self) -> Result<(), AuthError> {
        debug!(service = %self.service, "Deleting token from keyring");

        let entry = self.entry()?;

        match entry.delete_credential() {
            Ok(()) => {
                debug!("Token deleted from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No token to delete");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to delete token from keyring");
                Err(AuthError::storage_failed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires system keyring"]
    async fn test_store_and_retrieve_token() {
        let storage = KeyringTokenStorage::with_names("carousel-test", "test-token");
        let token = AuthToken::new_unchecked("gallery-session-token");

        storage.store_token(&token).await.unwrap();

        let retrieved = storage.get_token().await.unwrap();
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().as_str(), token.as_str());

        storage.delete_token().await.unwrap();
        assert!(!storage.has_token().await.unwrap());
    }

    #[test]
    fn test_backend_scoped_entry() {
        let storage = KeyringTokenStorage::for_backend("http://localhost:5001/");
        assert_eq!(storage.service, "carousel");
        assert_eq!(storage.user, "token@localhost:5001");

        let storage = KeyringTokenStorage::for_backend("https://gallery.example.com");
        assert_eq!(storage.user, "token@gallery.example.com");
    }

    #[test]
    fn test_unparsable_url_uses_plain_entry() {
        assert_eq!(KeyringTokenStorage::for_backend("not a url").user, "token");
    }

    #[test]
    fn test_default_names() {
        let storage = KeyringTokenStorage::default();
        assert_eq!(storage.service, "carousel");
        assert_eq!(storage.user, "token");
    }
}
