//! User configuration for spoty
//!
//! Settings come from `settings.json` in the config directory, overridden by
//! `SPOTY_*` environment variables (e.g. `SPOTY_CLIENT_ID`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Paths;
use crate::auth::{OAuthSettings, DEFAULT_AUTHORIZE_URL, DEFAULT_TOKEN_URL};
use crate::client::DEFAULT_API_BASE_URL;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "SPOTY";

/// User configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// OAuth client id registered with the authorization server
    #[serde(default)]
    pub client_id: String,

    /// Where the authorization server sends the browser back to
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Requested OAuth scopes
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Catalog API root
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// PKCE verifier length (43..=128)
    #[serde(default = "default_verifier_length")]
    pub verifier_length: usize,

    /// How long `login` waits for the redirect
    #[serde(default = "default_callback_timeout_secs")]
    pub callback_timeout_secs: u64,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            redirect_uri: default_redirect_uri(),
            scopes: default_scopes(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            api_base_url: default_api_base_url(),
            verifier_length: default_verifier_length(),
            callback_timeout_secs: default_callback_timeout_secs(),
        }
    }
}

impl UserConfig {
    /// Load settings.json (if present) layered with `SPOTY_*` variables
    pub fn load(paths: &Paths) -> Result<Self> {
        Self::load_with_env(paths, ENV_PREFIX)
    }

    pub fn load_with_env(paths: &Paths, env_prefix: &str) -> Result<Self> {
        let settings_path = paths.settings_path();

        let settings = ::config::Config::builder()
            .add_source(
                ::config::File::from(settings_path.as_path())
                    .format(::config::FileFormat::Json)
                    .required(false),
            )
            .add_source(
                ::config::Environment::with_prefix(env_prefix)
                    .try_parsing(true)
                    .list_separator(" ")
                    .with_list_parse_key("scopes"),
            )
            .build()
            .with_context(|| format!("Failed to read settings from {}", settings_path.display()))?;

        settings
            .try_deserialize()
            .context("Failed to parse settings")
    }

    /// Save configuration to settings.json
    pub fn save(&self, paths: &Paths) -> Result<()> {
        let settings_path = paths.settings_path();

        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(&settings_path, content).context("Failed to write settings file")?;

        Ok(())
    }

    pub fn oauth_settings(&self) -> OAuthSettings {
        OAuthSettings {
            client_id: self.client_id.clone(),
            redirect_uri: self.redirect_uri.clone(),
            scopes: self.scopes.clone(),
            authorize_url: self.authorize_url.clone(),
            token_url: self.token_url.clone(),
            verifier_length: self.verifier_length,
        }
    }

    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_secs)
    }
}

// Default value functions for serde

fn default_redirect_uri() -> String {
    "http://127.0.0.1:5173/callback".to_string()
}

fn default_scopes() -> Vec<String> {
    ["user-read-private", "user-library-read", "user-library-modify"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_authorize_url() -> String {
    DEFAULT_AUTHORIZE_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_verifier_length() -> usize {
    128
}

fn default_callback_timeout_secs() -> u64 {
    300
}
