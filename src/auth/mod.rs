//! OAuth2 PKCE login and session management

pub mod callback;
mod oauth;
pub mod pkce;
mod session;

pub use oauth::{AuthorizationFlow, OAuthSettings, DEFAULT_AUTHORIZE_URL, DEFAULT_TOKEN_URL};
pub use pkce::{generate_challenge, generate_verifier, PkcePair};
pub use session::{AuthSession, SessionState};

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Token exchange attempted without a verifier from a prior `begin`
    #[error("code verifier not found, start the login again")]
    MissingVerifier,
    #[error("token exchange error: {0}")]
    TokenExchange(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("authorization denied: {0}")]
    Denied(String),
    #[error("timeout waiting for authorization callback")]
    Timeout,
    #[error("callback server error: {0}")]
    Server(String),
    #[error("invalid auth configuration: {0}")]
    InvalidConfig(String),
}
