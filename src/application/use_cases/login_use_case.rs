//! Login, registration and logout workflow.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::dto::{LoginRequest, LoginResponse};
use crate::domain::entities::{AuthResponse, AuthToken};
use crate::domain::errors::AuthError;
use crate::domain::ports::{AuthPort, TokenStoragePort};

/// Handles user authentication workflow.
#[derive(Clone)]
pub struct LoginUseCase {
    auth_port: Arc<dyn AuthPort>,
    storage_port: Arc<dyn TokenStoragePort>,
}

impl LoginUseCase {
    /// Creates new login use case.
    #[must_use]
    pub const fn new(
        auth_port: Arc<dyn AuthPort>,
        storage_port: Arc<dyn TokenStoragePort>,
    ) -> Self {
        Self {
            auth_port,
            storage_port,
        }
    }

    /// Signs in with the request's credentials.
    ///
    /// # Errors
    /// Returns error if the credentials are blank or rejected.
    pub async fn execute(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        Self::check_credentials(&request)?;
        debug!(email = %request.credentials.email, "Attempting login");

        let response = self
            .auth_port
            .login(&request.credentials)
            .await
            .inspect_err(|e| warn!(error = %e, "Login failed"))?;

        Ok(self.finish(response, request.persist_token).await)
    }

    /// Creates an account, signing in if the backend issues a token.
    ///
    /// # Errors
    /// Returns error if the credentials are blank or rejected.
    pub async fn register(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        Self::check_credentials(&request)?;
        debug!(email = %request.credentials.email, "Attempting registration");

        let response = self
            .auth_port
            .register(&request.credentials)
            .await
            .inspect_err(|e| warn!(error = %e, "Registration failed"))?;

        Ok(self.finish(response, request.persist_token).await)
    }

    /// Signs out and deletes the stored token.
    ///
    /// The stored token is deleted even if the backend call fails.
    ///
    /// # Errors
    /// Returns error if the token cannot be deleted.
    pub async fn logout(&self) -> Result<(), AuthError> {
        if let Err(e) = self.auth_port.logout().await {
            warn!(error = %e, "Backend logout failed, forgetting token anyway");
        }
        self.delete_token().await
    }

    /// Deletes the stored token.
    ///
    /// # Errors
    /// Returns error if deletion fails.
    pub async fn delete_token(&self) -> Result<(), AuthError> {
        debug!("Deleting token from secure storage");
        match self.storage_port.delete_token().await {
            Ok(()) => {
                info!("Token deleted from secure storage");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to delete token from secure storage");
                Err(e)
            }
        }
    }

    fn check_credentials(request: &LoginRequest) -> Result<(), AuthError> {
        if request.credentials.email.trim().is_empty() {
            return Err(AuthError::rejected("email is required"));
        }
        if request.credentials.password.is_empty() {
            return Err(AuthError::rejected("password is required"));
        }
        Ok(())
    }

    async fn finish(&self, response: AuthResponse, persist: bool) -> LoginResponse {
        let token = response.token.as_deref().and_then(AuthToken::new);

        if let Some(user) = &response.user {
            info!(user = %user.display_name(), "Successfully authenticated");
        }

        let token_persisted = match &token {
            Some(token) if persist => match self.storage_port.store_token(token).await {
                Ok(()) => {
                    info!("Token persisted to secure storage");
                    true
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to persist token to secure storage");
                    false
                }
            },
            Some(_) => {
                debug!("Token persistence disabled, skipping storage");
                false
            }
            None => false,
        };

        LoginResponse {
            user: response.user,
            message: response.message,
            token_issued: token.is_some(),
            token_persisted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::UserProfile;
    use crate::domain::ports::MemoryTokenStorage;
    use crate::domain::ports::mocks::MockAuthPort;

    fn issued(token: Option<&str>) -> AuthResponse {
        AuthResponse {
            token: token.map(ToString::to_string),
            user: Some(UserProfile {
                id: "1".to_string(),
                username: "testuser".to_string(),
                ..UserProfile::default()
            }),
            message: None,
        }
    }

    #[tokio::test]
    async fn test_successful_login() {
        let mut auth_port = MockAuthPort::new();
        auth_port
            .expect_login()
            .times(1)
            .returning(|_| Ok(issued(Some("fresh-token"))));
        let storage_port = Arc::new(MemoryTokenStorage::new());

        let use_case = LoginUseCase::new(Arc::new(auth_port), storage_port.clone());
        let result = use_case
            .execute(LoginRequest::new("ann@example.com", "pw"))
            .await
            .unwrap();

        assert_eq!(result.user.unwrap().username, "testuser");
        assert!(result.token_persisted);
        let stored = storage_port.get_token().await.unwrap().unwrap();
        assert_eq!(stored.as_str(), "fresh-token");
    }

    #[tokio::test]
    async fn test_blank_credentials_are_rejected_locally() {
        let mut auth_port = MockAuthPort::new();
        auth_port.expect_login().never();
        let use_case = LoginUseCase::new(Arc::new(auth_port), Arc::new(MemoryTokenStorage::new()));

        let result = use_case.execute(LoginRequest::new("  ", "pw")).await;

        let error = tokio_test::assert_err!(result);
        assert!(matches!(error, AuthError::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let mut auth_port = MockAuthPort::new();
        auth_port
            .expect_login()
            .returning(|_| Err(AuthError::rejected("HTTP 401 Unauthorized")));
        let storage_port = Arc::new(MemoryTokenStorage::new());

        let use_case = LoginUseCase::new(Arc::new(auth_port), storage_port.clone());
        let result = use_case
            .execute(LoginRequest::new("ann@example.com", "wrong"))
            .await;

        assert!(matches!(result, Err(AuthError::Rejected { .. })));
        assert!(!storage_port.has_token().await.unwrap());
    }

    #[tokio::test]
    async fn test_login_without_persistence() {
        let mut auth_port = MockAuthPort::new();
        auth_port
            .expect_login()
            .returning(|_| Ok(issued(Some("fresh-token"))));
        let storage_port = Arc::new(MemoryTokenStorage::new());

        let use_case = LoginUseCase::new(Arc::new(auth_port), storage_port.clone());
        let request = LoginRequest::new("ann@example.com", "pw").without_persistence();
        let result = use_case.execute(request).await.unwrap();

        assert!(result.token_issued);
        assert!(!result.token_persisted);
        assert!(!storage_port.has_token().await.unwrap());
    }

    #[tokio::test]
    async fn test_register_without_token() {
        let mut auth_port = MockAuthPort::new();
        auth_port
            .expect_register()
            .withf(|c| c.username.as_deref() == Some("ann"))
            .returning(|_| Ok(issued(None)));
        let use_case = LoginUseCase::new(Arc::new(auth_port), Arc::new(MemoryTokenStorage::new()));

        let request = LoginRequest::new("ann@example.com", "pw").with_username("ann");
        let result = use_case.register(request).await.unwrap();

        assert!(!result.token_issued);
        assert!(!result.token_persisted);
    }

    #[tokio::test]
    async fn test_logout_forgets_token_even_if_backend_fails() {
        let mut auth_port = MockAuthPort::new();
        auth_port
            .expect_logout()
            .returning(|| Err(AuthError::NoTokenAvailable));
        let storage_port = Arc::new(MemoryTokenStorage::with_token(AuthToken::new_unchecked(
            "stale",
        )));

        let use_case = LoginUseCase::new(Arc::new(auth_port), storage_port.clone());
        tokio_test::assert_ok!(use_case.logout().await);

        assert!(!storage_port.has_token().await.unwrap());
    }
}
