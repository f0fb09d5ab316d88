//! Authorization Code + PKCE flow
//!
//! 1. [`AuthorizationFlow::begin`] persists a fresh verifier and returns the
//!    authorize URL carrying its challenge.
//! 2. The authorization server redirects back with `?code=..`.
//! 3. [`AuthorizationFlow::exchange_code`] trades the code and the stored
//!    verifier for an access token.

use reqwest::Method;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::pkce::{PkcePair, MAX_VERIFIER_LENGTH, MIN_VERIFIER_LENGTH};
use super::AuthError;
use crate::client::{error_message, HttpRequest, HttpTransport, ReqwestTransport};
use crate::storage::{KeyValueStore, VERIFIER_KEY};

pub const DEFAULT_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Authorization server parameters
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub authorize_url: String,
    pub token_url: String,
    pub verifier_length: usize,
}

/// Token endpoint response (only the access token is kept)
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Drives login against the authorization server
pub struct AuthorizationFlow {
    settings: OAuthSettings,
    storage: Arc<dyn KeyValueStore>,
    transport: Arc<dyn HttpTransport>,
}

impl AuthorizationFlow {
    pub fn new(settings: OAuthSettings, storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_transport(settings, storage, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(
        settings: OAuthSettings,
        storage: Arc<dyn KeyValueStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            settings,
            storage,
            transport,
        }
    }

    /// Generate and persist a verifier, then build the authorize URL.
    ///
    /// The verifier is stored before the URL is handed out so the redirect
    /// can always be completed.
    pub fn begin(&self) -> Result<String, AuthError> {
        if self.settings.client_id.trim().is_empty() {
            return Err(AuthError::InvalidConfig("client_id is not set".to_string()));
        }

        let length = self
            .settings
            .verifier_length
            .clamp(MIN_VERIFIER_LENGTH, MAX_VERIFIER_LENGTH);
        let pkce = PkcePair::new(length);
        self.storage.set(VERIFIER_KEY, &pkce.verifier)?;

        let params = [
            ("client_id", self.settings.client_id.clone()),
            ("response_type", "code".to_string()),
            ("redirect_uri", self.settings.redirect_uri.clone()),
            ("scope", self.settings.scopes.join(" ")),
            ("code_challenge_method", "S256".to_string()),
            ("code_challenge", pkce.challenge),
        ];
        let query = serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::Server(format!("failed to encode params: {e}")))?;

        debug!("Authorization redirect uri: {}", self.settings.redirect_uri);
        Ok(format!("{}?{}", self.settings.authorize_url, query))
    }

    /// Exchange an authorization code for an access token.
    ///
    /// Needs the verifier persisted by [`AuthorizationFlow::begin`]; it is
    /// removed once the exchange succeeds.
    pub async fn request_access_token(&self, code: &str) -> Result<String, AuthError> {
        let verifier = self
            .storage
            .get(VERIFIER_KEY)
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::MissingVerifier)?;

        let params = [
            ("client_id", self.settings.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.settings.redirect_uri.as_str()),
            ("code_verifier", verifier.as_str()),
        ];
        let body = serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::TokenExchange(format!("failed to encode params: {e}")))?;

        let mut request = HttpRequest::new(Method::POST, self.settings.token_url.clone());
        request.headers.push((
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        ));
        request.body = Some(body);

        let resp = self
            .transport
            .send(request)
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !resp.status.is_success() {
            let message = error_message(&resp.body).unwrap_or_else(|| resp.status_text());
            return Err(AuthError::TokenExchange(format!(
                "failed to fetch access token (HTTP {}): {}",
                resp.status.as_u16(),
                message
            )));
        }

        let token: TokenResponse = serde_json::from_str(&resp.body)
            .map_err(|e| AuthError::TokenExchange(format!("parse response: {e}")))?;

        if token.access_token.is_empty() {
            return Err(AuthError::TokenExchange(
                "response did not contain an access token".to_string(),
            ));
        }

        if let Err(e) = self.storage.remove(VERIFIER_KEY) {
            warn!("Failed to clear used verifier: {}", e);
        }

        info!(
            "Received access token (expires in {}s)",
            token.expires_in.unwrap_or_default()
        );
        Ok(token.access_token)
    }

    /// Like [`AuthorizationFlow::request_access_token`], but every failure is
    /// logged and reported as no token, sending the caller back to login.
    pub async fn exchange_code(&self, code: &str) -> Option<String> {
        match self.request_access_token(code).await {
            Ok(token) => Some(token),
            Err(e) => {
                error!("Token exchange failed: {}", e);
                None
            }
        }
    }
}
