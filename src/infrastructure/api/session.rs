//! In-memory authentication state shared with the HTTP interceptors.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::domain::entities::AuthToken;

/// Bearer token currently in use plus the unauthorized flag.
///
/// Interceptors run synchronously, so the token lives here rather than
/// behind the async storage port.
#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<AuthToken>>,
    unauthorized: AtomicBool,
}

impl Session {
    /// Returns a copy of the active token.
    #[must_use]
    pub fn token(&self) -> Option<AuthToken> {
        self.token.read().clone()
    }

    /// Activates `token` and clears the unauthorized flag.
    pub fn set_token(&self, token: AuthToken) {
        *self.token.write() = Some(token);
        self.unauthorized.store(false, Ordering::SeqCst);
    }

    /// Drops the active token.
    pub fn clear(&self) {
        *self.token.write() = None;
    }

    /// Drops the active token and flags the session unauthorized.
    pub fn invalidate(&self) {
        self.clear();
        self.unauthorized.store(true, Ordering::SeqCst);
    }

    /// Whether the backend rejected the last token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.unauthorized.load(Ordering::SeqCst)
    }

    /// Whether a token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }
}
