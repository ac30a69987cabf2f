//! Restores the session saved by an earlier run.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::dto::TokenSource;
use crate::domain::entities::AuthToken;
use crate::domain::ports::{AuthPort, TokenStoragePort};

/// Token picked for this run, with where it came from.
#[derive(Debug, Clone)]
pub struct RestoredSession {
    /// Bearer token.
    pub token: AuthToken,
    /// Where the token was found.
    pub source: TokenSource,
}

/// Picks a bearer token and hands it to the API client.
///
/// The keyring wins over `--token`/`CAROUSEL_TOKEN`, so a token saved by
/// `carousel login` keeps working when the environment still carries an
/// old one.
pub struct RestoreSessionUseCase {
    auth_port: Arc<dyn AuthPort>,
    storage_port: Arc<dyn TokenStoragePort>,
}

impl RestoreSessionUseCase {
    /// Creates new use case.
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

    /// Activates the best available token, or none.
    ///
    /// An unreadable keyring is logged and skipped.
    pub async fn execute(&self, cli_token: Option<String>) -> Option<RestoredSession> {
        let restored = match self.stored_token().await {
            Some(token) => Some(RestoredSession {
                token,
                source: TokenSource::Keyring,
            }),
            None => Self::cli_token(cli_token).map(|token| RestoredSession {
                token,
                source: TokenSource::CommandLine,
            }),
        };

        match &restored {
            Some(session) => {
                info!(source = %session.source, token = %session.token, "Restoring session");
                self.auth_port.activate_token(Some(session.token.clone()));
            }
            None => {
                debug!("No token available, continuing signed out");
                self.auth_port.activate_token(None);
            }
        }
        restored
    }

    async fn stored_token(&self) -> Option<AuthToken> {
        match self.storage_port.get_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Could not read the keyring");
                None
            }
        }
    }

    fn cli_token(raw: Option<String>) -> Option<AuthToken> {
        let raw = raw?;
        let token = AuthToken::new(raw.trim());
        if token.is_none() {
            debug!("Ignoring blank command-line token");
        }
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MemoryTokenStorage;
    use crate::domain::ports::mocks::MockAuthPort;

    fn expecting(token: Option<&'static str>) -> MockAuthPort {
        let mut auth = MockAuthPort::new();
        auth.expect_activate_token()
            .withf(move |t| t.as_ref().map(AuthToken::as_str) == token)
            .times(1)
            .return_const(());
        auth
    }

    #[tokio::test]
    async fn test_keyring_wins_over_cli() {
        let storage = Arc::new(MemoryTokenStorage::with_token(AuthToken::new_unchecked(
            "saved-token",
        )));
        let use_case = RestoreSessionUseCase::new(Arc::new(expecting(Some("saved-token"))), storage);

        let restored = use_case.execute(Some("cli-token".to_string())).await;

        assert_eq!(restored.map(|s| s.source), Some(TokenSource::Keyring));
    }

    #[tokio::test]
    async fn test_cli_token_when_keyring_is_empty() {
        let use_case = RestoreSessionUseCase::new(
            Arc::new(expecting(Some("cli-token"))),
            Arc::new(MemoryTokenStorage::new()),
        );

        let restored = use_case.execute(Some("  cli-token ".to_string())).await;

        assert_eq!(restored.map(|s| s.source), Some(TokenSource::CommandLine));
    }

    #[tokio::test]
    async fn test_blank_cli_token_leaves_session_signed_out() {
        let use_case = RestoreSessionUseCase::new(
            Arc::new(expecting(None)),
            Arc::new(MemoryTokenStorage::new()),
        );

        assert!(use_case.execute(Some("   ".to_string())).await.is_none());
    }
}
