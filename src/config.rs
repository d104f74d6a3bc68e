//! Configuration management for spotcli.
//!
//! Values are read from environment variables, optionally seeded from a `.env`
//! file in the local data directory. The lookup order is:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Built-in defaults pointing at the public Spotify endpoints

use std::{env, path::PathBuf};

use crate::{
    error::{Error, Result},
    types::ClientIdentity,
};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";

/// Loads environment variables from `spotcli/.env` in the local data directory.
///
/// A missing file is not an error; it only means every value falls back to the
/// process environment or the built-in defaults.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/spotcli/.env`
/// - macOS: `~/Library/Application Support/spotcli/.env`
/// - Windows: `%LOCALAPPDATA%/spotcli/.env`
pub async fn load_env() -> Result<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| {
            Error::InvalidInput(format!("cannot parse {}: {}", path.display(), e))
        })?;
    }
    Ok(())
}

/// Base directory for everything spotcli stores locally.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotcli");
    path
}

/// Location of the credential record.
///
/// Overridable with `SPOTCLI_CREDENTIALS`.
pub fn credentials_path() -> PathBuf {
    match env::var("SPOTCLI_CREDENTIALS") {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => data_dir().join("credentials.json"),
    }
}

/// Endpoints and client defaults used by the API access layer.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL for Web API endpoints, e.g. `https://api.spotify.com/v1`.
    pub api_url: String,
    pub auth_url: String,
    pub token_url: String,
    /// Must match a redirect URI registered for the client application.
    pub redirect_uri: String,
    /// Deployment-provisioned client pair used when the user supplies none.
    pub default_client: Option<ClientIdentity>,
}

impl ApiConfig {
    /// Builds the configuration from `SPOTIFY_API_*` environment variables.
    ///
    /// The default client pair is only set when both
    /// `SPOTIFY_API_AUTH_CLIENT_ID` and `SPOTIFY_API_AUTH_CLIENT_SECRET` are present.
    pub fn from_env() -> Self {
        let default_client = match (
            non_empty_var("SPOTIFY_API_AUTH_CLIENT_ID"),
            non_empty_var("SPOTIFY_API_AUTH_CLIENT_SECRET"),
        ) {
            (Some(id), Some(secret)) => Some(ClientIdentity::new(id, secret)),
            _ => None,
        };

        Self {
            api_url: var_or("SPOTIFY_API_URL", DEFAULT_API_URL),
            auth_url: var_or("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: var_or("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
            redirect_uri: var_or("SPOTIFY_API_REDIRECT_URI", DEFAULT_REDIRECT_URI),
            default_client,
        }
    }

    /// Points every endpoint at `base_url`, e.g. a local mock server.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            api_url: format!("{base}/v1"),
            auth_url: format!("{base}/authorize"),
            token_url: format!("{base}/api/token"),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            default_client: None,
        }
    }

    pub fn with_default_client(mut self, client: ClientIdentity) -> Self {
        self.default_client = Some(client);
        self
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    non_empty_var(key).unwrap_or_else(|| default.to_string())
}
