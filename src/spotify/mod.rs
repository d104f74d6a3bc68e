//! # Spotify API Access Layer
//!
//! This module is the only place where spotcli talks to Spotify. Command
//! bodies in [`crate::cli`] build on the four pieces exported here and never
//! issue HTTP calls on their own.
//!
//! ## Architecture
//!
//! ```text
//! Commands (login, status, lists)
//!          ↓
//!   Pager      BatchExecutor
//!      ↘          ↙
//!      SpotifyClient  (one authenticated call, 401 refresh-retry)
//!          ↓
//!      Authorizer     (authorization-code grant, refresh grant)
//!          ↓
//!      CredentialStore (crate::management)
//! ```
//!
//! ## Components
//!
//! - [`auth`] - [`Authorizer`] owns the token lifecycle: it builds the
//!   authorization URL, exchanges verification codes, refreshes tokens
//!   proactively and after a rejection, and re-authorizes with an added scope
//!   when a batch asks for it. Refreshes are serialized behind a single gate.
//! - [`client`] - [`SpotifyClient`] issues one request with a valid bearer
//!   token and maps non-2xx responses onto [`crate::error::Error`].
//! - [`pager`] - [`Pager`] is a bounded `next`/`previous` cursor over
//!   `limit`/`offset` collection endpoints such as `me/playlists`.
//! - [`batch`] - [`BatchExecutor`] runs independent requests in order and
//!   applies per-status [`Remediation`]s without aborting the batch.
//! - [`scopes`] - the static permission registry.
//!
//! ## Error Handling
//!
//! | Response | Result |
//! |----------|--------|
//! | 2xx | parsed JSON body (`Value::Null` when empty) |
//! | 401 | one refresh and retry, then `AuthRefresh` |
//! | 403 | `AuthScope`, remediable inside a batch |
//! | 429 | `RateLimit` with the `Retry-After` hint, not retried |
//! | other | `Api { status, message }` |
//!
//! Nothing else is retried automatically.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let store: Arc<dyn CredentialStore> = Arc::new(FileStore::default());
//! let authorizer = Arc::new(Authorizer::new(ApiConfig::from_env(), store));
//! let client = SpotifyClient::new(Arc::clone(&authorizer));
//!
//! let mut pager = Pager::<Playlist>::new(&client, "me/playlists", 10).await?;
//! while let Ok(items) = pager.next().await? {
//!     println!("{} playlists on this page", items.len());
//! }
//! ```

pub mod auth;
pub mod batch;
pub mod client;
pub mod pager;
pub mod scopes;

pub use auth::{AuthorizationPrompt, Authorizer, LoginRequest};
pub use batch::{BatchExecutor, BatchOutcome, BatchRequest, Remediation};
pub use client::SpotifyClient;
pub use pager::{Pager, Step};
pub use scopes::ScopeId;
