//! Auth session: the current bearer token and its persistence

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::client::ApiError;
use crate::storage::{KeyValueStore, TOKEN_KEY, VERIFIER_KEY};

/// What UI collaborators observe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Authenticated,
    /// Return to the unauthenticated entry point
    SignedOut,
}

/// Owns the current access token.
///
/// The token is read from storage once, at construction. There is no refresh
/// and no expiry check; an expired token shows up as
/// [`ApiError::AuthExpired`], after which callers should log out.
pub struct AuthSession {
    storage: Arc<dyn KeyValueStore>,
    token: RwLock<Option<String>>,
    state: watch::Sender<SessionState>,
}

impl AuthSession {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let token = storage.get(TOKEN_KEY).filter(|t| !t.is_empty());
        let initial = if token.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::SignedOut
        };
        let (state, _) = watch::channel(initial);

        Self {
            storage,
            token: RwLock::new(token),
            state,
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receiver notified on every login/logout
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Store `token` as the current session. Never fails: a storage error is
    /// logged and the token is still kept for this process.
    pub fn login(&self, token: &str) {
        if token.is_empty() {
            warn!("Ignoring login with an empty token");
            return;
        }

        if let Err(e) = self.storage.set(TOKEN_KEY, token) {
            warn!("Failed to persist token: {}", e);
        }
        *self.token.write() = Some(token.to_string());
        self.state.send_replace(SessionState::Authenticated);
        info!("Logged in");
    }

    /// Forget the token and the pending PKCE verifier
    pub fn logout(&self) {
        for key in [TOKEN_KEY, VERIFIER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!("Failed to remove {}: {}", key, e);
            }
        }
        *self.token.write() = None;
        self.state.send_replace(SessionState::SignedOut);
        info!("Logged out");
    }

    /// Log out when `err` means the token is no longer accepted.
    ///
    /// Returns whether a logout happened.
    pub fn handle_api_error(&self, err: &ApiError) -> bool {
        if err.is_auth_expired() {
            warn!("Access token expired, logging out");
            self.logout();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{JsonFileStore, MemoryStore};
    use tempfile::TempDir;

    #[test]
    fn test_login_persists_token() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let storage: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&path).unwrap());
        let session = AuthSession::new(storage.clone());
        assert!(!session.is_authenticated());

        session.login("tok123");
        assert_eq!(session.token().as_deref(), Some("tok123"));
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("tok123"));

        // a fresh process reads the same token back
        let reopened: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&path).unwrap());
        let session = AuthSession::new(reopened);
        assert_eq!(session.token().as_deref(), Some("tok123"));
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[test]
    fn test_logout_clears_token_and_verifier() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        storage.set(VERIFIER_KEY, "verifier-value").unwrap();

        let session = AuthSession::new(storage.clone());
        session.login("tok123");
        session.logout();

        assert!(session.token().is_none());
        assert!(storage.get(TOKEN_KEY).is_none());
        assert!(storage.get(VERIFIER_KEY).is_none());
        assert_eq!(session.state(), SessionState::SignedOut);
    }

    #[test]
    fn test_empty_token_is_absent() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        storage.set(TOKEN_KEY, "").unwrap();

        let session = AuthSession::new(storage.clone());
        assert!(session.token().is_none());

        session.login("");
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_subscribers_see_logout() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let session = AuthSession::new(storage);
        session.login("tok");

        let mut rx = session.subscribe();
        assert_eq!(*rx.borrow(), SessionState::Authenticated);

        session.logout();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), SessionState::SignedOut);
    }

    #[test]
    fn test_auth_expired_forces_logout() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let session = AuthSession::new(storage);
        session.login("tok");

        let denied = ApiError::PermissionDenied {
            message: "nope".to_string(),
        };
        assert!(!session.handle_api_error(&denied));
        assert!(session.is_authenticated());

        assert!(session.handle_api_error(&ApiError::AuthExpired));
        assert!(!session.is_authenticated());
    }
}
