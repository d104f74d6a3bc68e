use std::sync::Arc;

use reqwest::{Method, Response, StatusCode, header::RETRY_AFTER};
use serde_json::Value;

use crate::{
    error::{Error, Result},
    spotify::auth::Authorizer,
};

/// Issues authenticated calls against the Web API.
///
/// Every call obtains a fresh-enough token from the [`Authorizer`] first. A
/// 401 mid-flight triggers exactly one refresh-and-retry; nothing else is
/// retried, so a flaky network never duplicates a mutation.
#[derive(Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    authorizer: Arc<Authorizer>,
}

impl SpotifyClient {
    pub fn new(authorizer: Arc<Authorizer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            authorizer,
        }
    }

    pub fn authorizer(&self) -> &Arc<Authorizer> {
        &self.authorizer
    }

    /// Sends a `GET` to `endpoint`.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Path relative to the API base URL, e.g. `me` or
    ///   `me/playlists`. A leading `/` is ignored.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let me = client.get("me").await?;
    /// println!("{}", me["display_name"]);
    /// ```
    pub async fn get(&self, endpoint: &str) -> Result<Value> {
        self.request(Method::GET, endpoint, None).await
    }

    /// Sends a `PUT` to `endpoint` with an optional JSON body.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// client
    ///     .put("playlists/37i9dQZF1DXcBWIGoYBM5M/followers", Some(&json!({"public": true})))
    ///     .await?;
    /// ```
    pub async fn put(&self, endpoint: &str, body: Option<&Value>) -> Result<Value> {
        self.request(Method::PUT, endpoint, body).await
    }

    /// Sends `method` to `endpoint` (relative to the API base URL) and
    /// returns the parsed JSON body, or `Value::Null` for an empty body.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.request_with_query(method, endpoint, &[], body).await
    }

    /// Full form of [`request`](Self::request) with query parameters.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method of the call
    /// * `endpoint` - Path relative to the API base URL
    /// * `query` - Query pairs appended to the URL, e.g. `limit`/`offset`
    /// * `body` - JSON body, sent with `Content-Type: application/json`
    ///
    /// # Errors
    ///
    /// - [`Error::NotLoggedIn`] if no credentials are stored
    /// - [`Error::AuthRefresh`] if the refresh grant fails, or the token is
    ///   rejected again right after a refresh
    /// - [`Error::AuthScope`] on 403, [`Error::RateLimit`] on 429 and
    ///   [`Error::Api`] on any other non-2xx status
    /// - [`Error::Http`] / [`Error::Decode`] for transport and body problems
    pub async fn request_with_query(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let token = self.authorizer.valid_access_token().await?;
        let response = self.send(&method, endpoint, query, body, &token).await?;

        let response = if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!(endpoint, "access token rejected, refreshing once");
            let token = self.authorizer.refresh_rejected(&token).await?;
            let retried = self.send(&method, endpoint, query, body, &token).await?;
            if retried.status() == StatusCode::UNAUTHORIZED {
                return Err(Error::AuthRefresh(
                    "access token rejected again after refresh".to_string(),
                ));
            }
            retried
        } else {
            response
        };

        parse_response(endpoint, response).await
    }

    async fn send(
        &self,
        method: &Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        token: &str,
    ) -> Result<Response> {
        let url = self.url(endpoint);
        tracing::debug!(%method, %url, "sending request");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.authorizer.config().api_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

async fn parse_response(endpoint: &str, response: Response) -> Result<Value> {
    let status = response.status();
    if status.is_success() {
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_slice(&bytes)?);
    }

    match status {
        StatusCode::FORBIDDEN => Err(Error::AuthScope {
            endpoint: endpoint.to_string(),
            scope: None,
        }),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            tracing::warn!(endpoint, ?retry_after, "rate limited");
            Err(Error::RateLimit { retry_after })
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(Error::Api {
                status,
                message: api_error_message(status, &body),
            })
        }
    }
}

/// Extracts the message of a Web API `{"error": {"status", "message"}}` body.
fn api_error_message(status: StatusCode, body: &str) -> String {
    let json: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    json["error"]["message"]
        .as_str()
        .or_else(|| json["error"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string()
        })
}
