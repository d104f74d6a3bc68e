//! Error types for the Spotify API access layer.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side is
//! the [`Error`] taxonomy below. Cursor boundaries reached by a
//! [`Pager`](crate::spotify::Pager) are *not* errors and are reported through
//! [`PagerBoundary`] instead.

use reqwest::StatusCode;
use thiserror::Error;

use crate::spotify::ScopeId;

/// Convenient result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The authorization code was rejected. The user has to log in again.
    #[error("failed to exchange authorization code: {0}")]
    AuthExchange(String),

    /// The refresh token was rejected. Fatal, requires a full re-login.
    #[error("failed to refresh access token: {0}. Please run `spotcli auth login`")]
    AuthRefresh(String),

    /// The current token lacks a permission needed by `endpoint`.
    #[error("{}", scope_message(.endpoint, .scope))]
    AuthScope {
        endpoint: String,
        scope: Option<ScopeId>,
    },

    /// The provider throttled the request.
    #[error("{}", rate_limit_message(.retry_after))]
    RateLimit { retry_after: Option<u64> },

    /// Any other non-2xx response.
    #[error("Spotify API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("no stored credentials. Please run `spotcli auth login`")]
    NotLoggedIn,

    /// An interactive flow was abandoned by the user.
    #[error("operation cancelled")]
    Cancelled,

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// HTTP status this error stands for, if it came from an API response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::AuthScope { .. } => Some(StatusCode::FORBIDDEN),
            Error::RateLimit { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the command layer should re-prompt instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

fn scope_message(endpoint: &str, scope: &Option<ScopeId>) -> String {
    match scope {
        Some(scope) => format!(
            "insufficient permissions for `{endpoint}`. Re-authorize with the `{scope}` scope"
        ),
        None => format!("insufficient permissions for `{endpoint}`"),
    }
}

fn rate_limit_message(retry_after: &Option<u64>) -> String {
    match retry_after {
        Some(secs) => format!("rate limited by Spotify, retry after {secs} seconds"),
        None => "rate limited by Spotify, please try again later".to_string(),
    }
}

/// A cursor boundary hit by [`Pager::next`](crate::spotify::Pager::next) or
/// [`Pager::previous`](crate::spotify::Pager::previous).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerBoundary {
    /// The current page is the last one.
    LimitReached,
    /// The current page is the first one.
    PreviousUnavailable,
}

impl std::fmt::Display for PagerBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PagerBoundary::LimitReached => write!(f, "There are no more results to display."),
            PagerBoundary::PreviousUnavailable => write!(f, "You are already at the first page."),
        }
    }
}
