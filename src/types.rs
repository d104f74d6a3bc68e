use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::spotify::{ScopeId, scopes};

/// Client identity used against the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub id: String,
    pub secret: String,
}

impl ClientIdentity {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }
}

/// The persisted credential record.
///
/// `client_id`/`client_secret` are only set when the user authenticated with
/// their own application; otherwise the configured default pair is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Human-readable names of the granted non-default scope groups.
    #[serde(default)]
    pub auth_scopes: Vec<String>,
}

impl Credentials {
    /// Custom client pair, if the user supplied one.
    pub fn custom_client(&self) -> Option<ClientIdentity> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() => {
                Some(ClientIdentity::new(id.clone(), secret.clone()))
            }
            _ => None,
        }
    }

    /// True if the access token is missing or expires within `buffer`.
    pub fn is_expired(&self, buffer: Duration) -> bool {
        match (&self.access_token, self.expires_at) {
            (Some(_), Some(expires_at)) => Utc::now() + buffer >= expires_at,
            _ => true,
        }
    }

    /// Granted scope ids, always including the default group.
    pub fn granted_scopes(&self) -> BTreeSet<ScopeId> {
        let mut granted: BTreeSet<ScopeId> = self
            .auth_scopes
            .iter()
            .filter_map(|name| scopes::by_name(name))
            .map(|g| g.scope_id())
            .collect();
        granted.insert(scopes::default_group().scope_id());
        granted
    }

    pub fn apply(&mut self, field: CredentialField) {
        match field {
            CredentialField::ClientId(v) => self.client_id = v,
            CredentialField::ClientSecret(v) => self.client_secret = v,
            CredentialField::AccessToken(v) => self.access_token = Some(v),
            CredentialField::RefreshToken(v) => self.refresh_token = Some(v),
            CredentialField::ExpiresAt(v) => self.expires_at = Some(v),
            CredentialField::AuthScopes(v) => self.auth_scopes = v,
        }
    }
}

/// One field of a partial credential update.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialField {
    ClientId(Option<String>),
    ClientSecret(Option<String>),
    AccessToken(String),
    RefreshToken(String),
    ExpiresAt(DateTime<Utc>),
    AuthScopes(Vec<String>),
}

/// Response of the token endpoint for both grant types.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

/// A page of a collection endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistTracks {
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub owner: PlaylistOwner,
    #[serde(default)]
    pub tracks: PlaylistTracks,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    #[tabled(rename = "#")]
    pub index: u32,
    #[tabled(rename = "Playlist")]
    pub name: String,
    #[tabled(rename = "Created by")]
    pub owner: String,
    #[tabled(rename = "# of tracks")]
    pub tracks: u32,
}
