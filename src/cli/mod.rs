//! # CLI Module
//!
//! Command bodies for spotcli. Each command builds a [`Session`] and works
//! exclusively through the API access layer in [`crate::spotify`]; this module
//! only adds prompts, tables and console output on top of it.
//!
//! ## Commands
//!
//! - [`login`] - interactive authorization-code login with scope selection
//! - [`status`] - shows the logged-in user
//! - [`lists`] - browses the user's playlists page by page, playing or saving
//!   selected ones
//!
//! ## Usage Patterns
//!
//! ```bash
//! spotcli auth login                       # authenticate with the default client
//! spotcli auth login --client-id <id> --client-secret <secret>
//! spotcli auth status -v                   # who is logged in, and where creds live
//! spotcli lists --limit 20                 # interactive playlist browser
//! spotcli lists --raw                      # every playlist as JSON
//! ```
//!
//! Boundary conditions (no further page, malformed input) are reported and the
//! user is prompted again. Any other error is returned to `main`, which prints
//! it and exits with a non-zero status.

use std::{path::PathBuf, sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    config::{self, ApiConfig},
    management::{CredentialStore, FileStore},
    spotify::{Authorizer, SpotifyClient},
};

mod auth;
mod lists;
mod prompt;

pub use auth::login;
pub use auth::status;
pub use lists::lists;
pub use prompt::TerminalPrompt;

/// Wiring of store, authorizer and client shared by all commands.
pub struct Session {
    pub credentials_path: PathBuf,
    pub authorizer: Arc<Authorizer>,
    pub client: SpotifyClient,
}

impl Session {
    pub fn from_env() -> Self {
        let credentials_path = config::credentials_path();
        let store: Arc<dyn CredentialStore> = Arc::new(FileStore::new(credentials_path.clone()));
        let authorizer = Arc::new(Authorizer::new(ApiConfig::from_env(), store));
        let client = SpotifyClient::new(Arc::clone(&authorizer));

        Self {
            credentials_path,
            authorizer,
            client,
        }
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}
