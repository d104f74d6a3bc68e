use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;
use url::Url;

use crate::{
    config::ApiConfig,
    error::{Error, Result},
    management::CredentialStore,
    spotify::scopes::{self, ScopeGroup, ScopeId},
    types::{ClientIdentity, CredentialField, Credentials, TokenResponse},
};

/// Tokens expiring within this window are refreshed before use.
const EXPIRY_BUFFER_SECONDS: i64 = 60;

/// Interactive capability used by the authorization flow.
///
/// The terminal implementation opens a browser and reads the verification
/// code from stdin; tests substitute a scripted fake.
pub trait AuthorizationPrompt: Send + Sync {
    /// Asks a yes/no question.
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;

    /// Hands `url` to the user and returns the verification code they paste
    /// back, or `None` if they abandon the flow.
    fn authorize(&self, url: &Url) -> Result<Option<String>>;
}

/// Input of [`Authorizer::login`].
#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    /// Custom client pair supplied on the command line.
    pub client: Option<ClientIdentity>,
    /// Human-readable names of the non-default scope groups to request.
    pub scopes: Vec<String>,
}

/// Drives the authorization-code exchange and token refresh.
///
/// All writes of the token fields go through the refresh gate, so at most one
/// refresh-grant call is in flight at any time.
pub struct Authorizer {
    config: ApiConfig,
    store: Arc<dyn CredentialStore>,
    http: Client,
    refresh_gate: Mutex<()>,
}

impl Authorizer {
    pub fn new(config: ApiConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            config,
            store,
            http: Client::new(),
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Builds the browser URL for the authorization-code grant.
    ///
    /// `requested_scopes` are human-readable group names; the default group is
    /// always added. An empty `client_id` selects the configured default client.
    pub fn build_authorization_url<S: AsRef<str>>(
        &self,
        requested_scopes: &[S],
        client_id: &str,
    ) -> Result<Url> {
        let groups = scopes::resolve_names(requested_scopes)?;
        let client_id = if client_id.is_empty() {
            self.effective_client(None)?.id
        } else {
            client_id.to_string()
        };
        self.authorization_url(&groups, &client_id)
    }

    fn authorization_url(&self, groups: &[&ScopeGroup], client_id: &str) -> Result<Url> {
        let scope = scopes::provider_scopes(groups).join(" ");
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", client_id),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", scope.as_str()),
            ],
        )?;
        Ok(url)
    }

    /// Custom pair if given, otherwise the configured default pair.
    fn effective_client(&self, custom: Option<ClientIdentity>) -> Result<ClientIdentity> {
        custom
            .or_else(|| self.config.default_client.clone())
            .ok_or_else(|| {
                Error::InvalidInput(
                    "no default client configured. Please provide --client-id and --client-secret"
                        .to_string(),
                )
            })
    }

    /// Exchanges a verification code for tokens.
    ///
    /// The returned record only carries the token fields; nothing is persisted.
    pub async fn exchange_code(&self, code: &str, client: &ClientIdentity) -> Result<Credentials> {
        tracing::debug!(client_id = %client.id, "exchanging authorization code");
        let token = self
            .token_request(
                client,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", self.config.redirect_uri.as_str()),
                ],
                Error::AuthExchange,
            )
            .await?;

        let refresh_token = token.refresh_token.ok_or_else(|| {
            Error::AuthExchange("token endpoint returned no refresh token".to_string())
        })?;
        let expires_at = expiry_from(token.expires_in).ok_or_else(|| {
            Error::AuthExchange(format!("invalid token lifetime: {}", token.expires_in))
        })?;

        Ok(Credentials {
            access_token: Some(token.access_token),
            refresh_token: Some(refresh_token),
            expires_at: Some(expires_at),
            ..Credentials::default()
        })
    }

    /// Performs the refresh-token grant and stores the new tokens.
    pub async fn refresh(&self) -> Result<Credentials> {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<Credentials> {
        let current = self.store.load().await?.ok_or(Error::NotLoggedIn)?;
        let refresh_token = current
            .refresh_token
            .clone()
            .ok_or_else(|| Error::AuthRefresh("no refresh token stored".to_string()))?;
        let client = self.effective_client(current.custom_client())?;

        tracing::debug!(client_id = %client.id, "refreshing access token");
        let token = self
            .token_request(
                &client,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token.as_str()),
                ],
                Error::AuthRefresh,
            )
            .await?;

        let expires_at = expiry_from(token.expires_in).ok_or_else(|| {
            Error::AuthRefresh(format!("invalid token lifetime: {}", token.expires_in))
        })?;

        // The provider may keep the refresh token and omit it from the response.
        let fields = vec![
            CredentialField::AccessToken(token.access_token),
            CredentialField::RefreshToken(token.refresh_token.unwrap_or(refresh_token)),
            CredentialField::ExpiresAt(expires_at),
        ];
        self.store.save(fields).await
    }

    /// Returns an access token that is not about to expire, refreshing first
    /// if necessary.
    pub async fn valid_access_token(&self) -> Result<String> {
        let buffer = Duration::seconds(EXPIRY_BUFFER_SECONDS);
        let current = self.store.load().await?.ok_or(Error::NotLoggedIn)?;
        if !current.is_expired(buffer) {
            if let Some(token) = current.access_token {
                return Ok(token);
            }
        }

        let _gate = self.refresh_gate.lock().await;
        // Another caller may have refreshed while we waited for the gate.
        let current = self.store.load().await?.ok_or(Error::NotLoggedIn)?;
        let current = if current.is_expired(buffer) {
            self.refresh_locked().await?
        } else {
            current
        };
        current
            .access_token
            .ok_or_else(|| Error::AuthRefresh("no access token stored".to_string()))
    }

    /// Refreshes after the provider rejected `rejected` mid-flight.
    ///
    /// If the stored token already differs from `rejected`, another caller
    /// refreshed it and the stored one is returned as is.
    pub async fn refresh_rejected(&self, rejected: &str) -> Result<String> {
        let _gate = self.refresh_gate.lock().await;
        let current = self.store.load().await?.ok_or(Error::NotLoggedIn)?;
        let current = match current.access_token.as_deref() {
            Some(token) if token != rejected => current,
            _ => self.refresh_locked().await?,
        };
        current
            .access_token
            .ok_or_else(|| Error::AuthRefresh("no access token stored".to_string()))
    }

    /// Runs the full interactive login.
    ///
    /// If no client pair is given but a custom one is stored, the user is
    /// asked whether to reuse it; declining reverts to the default pair.
    /// Nothing is written unless the code exchange succeeds, in which case the
    /// client pair, tokens and scope names are saved in one replace.
    pub async fn login(
        &self,
        prompt: &dyn AuthorizationPrompt,
        request: LoginRequest,
    ) -> Result<Credentials> {
        let groups = scopes::resolve_names(&request.scopes)?;
        let stored = self.store.load().await?.unwrap_or_default();

        let custom = match (request.client, stored.custom_client()) {
            (Some(client), _) => Some(client),
            (None, Some(previous)) => {
                let reuse = prompt.confirm(
                    "You used a custom Client ID and secret to authenticate last time. \
                     Use these again?\n(Type \"n\" to revert to the default ID and secret)",
                    true,
                )?;
                if reuse { Some(previous) } else { None }
            }
            (None, None) => None,
        };
        let client = self.effective_client(custom.clone())?;

        let _gate = self.refresh_gate.lock().await;
        let tokens = self
            .authorize_and_exchange(prompt, &groups, &client)
            .await?
            .ok_or(Error::Cancelled)?;

        let mut fields = token_fields(tokens);
        fields.push(CredentialField::ClientId(custom.as_ref().map(|c| c.id.clone())));
        fields.push(CredentialField::ClientSecret(custom.map(|c| c.secret)));
        fields.push(CredentialField::AuthScopes(scope_names(&groups)));
        let credentials = self.store.save(fields).await?;

        tracing::debug!(scopes = ?credentials.auth_scopes, "login complete");
        Ok(credentials)
    }

    /// Remediation for a missing permission.
    ///
    /// Asks the user to re-authorize with `scope` added to the granted ones,
    /// reusing the stored client pair. Returns `false` if the scope is already
    /// granted or the user declines or abandons the flow, in which case nothing
    /// is written.
    pub async fn grant_scope(
        &self,
        prompt: &dyn AuthorizationPrompt,
        scope: &ScopeId,
    ) -> Result<bool> {
        let group = scopes::by_id(scope)
            .ok_or_else(|| Error::InvalidInput(format!("unknown permission `{scope}`")))?;
        let stored = self.store.load().await?.ok_or(Error::NotLoggedIn)?;
        if stored.granted_scopes().contains(scope) {
            // re-authorizing with the same scopes would yield the same token
            tracing::debug!(scope = %scope, "scope already granted, not asking again");
            return Ok(false);
        }

        let accepted = prompt.confirm(
            &format!(
                "This action requires the \"{}\" permission. Re-authorize now?",
                group.name
            ),
            true,
        )?;
        if !accepted {
            return Ok(false);
        }

        let mut groups = scopes::resolve_names(
            &stored
                .auth_scopes
                .iter()
                .filter(|name| scopes::by_name(name).is_some())
                .collect::<Vec<_>>(),
        )?;
        if !group.is_default() && !groups.iter().any(|g| g.id == group.id) {
            groups.push(group);
        }
        let client = self.effective_client(stored.custom_client())?;

        let _gate = self.refresh_gate.lock().await;
        let Some(tokens) = self.authorize_and_exchange(prompt, &groups, &client).await? else {
            return Ok(false);
        };

        let mut fields = token_fields(tokens);
        fields.push(CredentialField::AuthScopes(scope_names(&groups)));
        self.store.save(fields).await?;

        tracing::debug!(scope = %scope, "scope granted");
        Ok(true)
    }

    async fn authorize_and_exchange(
        &self,
        prompt: &dyn AuthorizationPrompt,
        groups: &[&ScopeGroup],
        client: &ClientIdentity,
    ) -> Result<Option<Credentials>> {
        let url = self.authorization_url(groups, &client.id)?;
        let code = match prompt.authorize(&url)? {
            Some(code) if !code.trim().is_empty() => code,
            _ => return Ok(None),
        };
        self.exchange_code(code.trim(), client).await.map(Some)
    }

    async fn token_request(
        &self,
        client: &ClientIdentity,
        form: &[(&str, &str)],
        reject: fn(String) -> Error,
    ) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.config.token_url)
            .basic_auth(&client.id, Some(&client.secret))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "token endpoint rejected the grant");
            return Err(reject(token_error_message(status, &body)));
        }

        Ok(response.json::<TokenResponse>().await?)
    }
}

/// Absolute expiry for a token living `expires_in` seconds from now, or
/// `None` if the lifetime is negative or out of range.
fn expiry_from(expires_in: i64) -> Option<DateTime<Utc>> {
    if expires_in < 0 {
        return None;
    }
    Duration::try_seconds(expires_in)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
}

fn token_fields(tokens: Credentials) -> Vec<CredentialField> {
    let mut fields = Vec::with_capacity(6);
    if let Some(token) = tokens.access_token {
        fields.push(CredentialField::AccessToken(token));
    }
    if let Some(token) = tokens.refresh_token {
        fields.push(CredentialField::RefreshToken(token));
    }
    if let Some(expires_at) = tokens.expires_at {
        fields.push(CredentialField::ExpiresAt(expires_at));
    }
    fields
}

fn scope_names(groups: &[&ScopeGroup]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for group in groups.iter().filter(|g| !g.is_default()) {
        if !names.iter().any(|n| n == group.name) {
            names.push(group.name.to_string());
        }
    }
    names
}

/// Extracts `error_description`/`error` from an OAuth error body.
fn token_error_message(status: StatusCode, body: &str) -> String {
    let json: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let description = json["error_description"].as_str();
    let code = json["error"].as_str();
    match (code, description) {
        (Some(code), Some(description)) => format!("{code}: {description}"),
        (Some(code), None) => code.to_string(),
        (None, Some(description)) => description.to_string(),
        (None, None) => status.to_string(),
    }
}
