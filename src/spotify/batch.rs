use std::collections::{BTreeMap, HashSet};

use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::{
    error::{Error, Result},
    spotify::{
        ScopeId,
        auth::{AuthorizationPrompt, Authorizer},
        client::SpotifyClient,
    },
    warning,
};

/// Recovery to attempt when a request fails with a given status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remediation {
    /// Re-authorize with this scope group added, then retry once.
    RequireScope(ScopeId),
}

/// One independent request of a batch.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Value>,
    pub error_handlers: BTreeMap<u16, Remediation>,
}

impl BatchRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
            error_handlers: BTreeMap::new(),
        }
    }

    /// Sets the JSON body sent with the request.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Registers the remediation to attempt when the request fails with
    /// `status`. A later registration for the same status replaces the earlier.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let request = BatchRequest::new(Method::PUT, "me/player/play")
    ///     .with_body(json!({"context_uri": playlist.uri}))
    ///     .on_status(
    ///         StatusCode::FORBIDDEN,
    ///         Remediation::RequireScope(ScopeId::new("modify-playback")),
    ///     );
    /// ```
    pub fn on_status(mut self, status: StatusCode, remediation: Remediation) -> Self {
        self.error_handlers.insert(status.as_u16(), remediation);
        self
    }

    fn handler_for(&self, error: &Error) -> Option<&Remediation> {
        error
            .status()
            .and_then(|status| self.error_handlers.get(&status.as_u16()))
    }
}

/// Results of a batch, one per request, in input order.
#[derive(Debug)]
pub struct BatchOutcome {
    pub results: Vec<Result<Value>>,
}

impl BatchOutcome {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of requests that ended in success, counting successful retries.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    /// Failed requests as `(input position, error)` pairs, in input order.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &Error)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().err().map(|e| (i, e)))
    }
}

/// Runs independent requests sequentially, isolating failures.
///
/// Requests are never issued concurrently, which keeps the output order
/// deterministic and means at most one of them can trigger a token refresh.
pub struct BatchExecutor<'a> {
    client: &'a SpotifyClient,
    authorizer: &'a Authorizer,
    prompt: &'a dyn AuthorizationPrompt,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(
        client: &'a SpotifyClient,
        authorizer: &'a Authorizer,
        prompt: &'a dyn AuthorizationPrompt,
    ) -> Self {
        Self {
            client,
            authorizer,
            prompt,
        }
    }

    /// Runs `requests` one after another and collects one result per request.
    ///
    /// A failure never stops the batch. When a failed request has a
    /// remediation registered for its status, the remediation runs and, if it
    /// succeeds, the request is retried exactly once. A scope the user declines
    /// is not offered again for later requests of the same batch.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let outcome = BatchExecutor::new(&client, &authorizer, &TerminalPrompt)
    ///     .execute(requests)
    ///     .await;
    /// for (index, error) in outcome.failures() {
    ///     warning!("request {} failed: {}", index + 1, error);
    /// }
    /// ```
    pub async fn execute(&self, requests: Vec<BatchRequest>) -> BatchOutcome {
        let mut declined: HashSet<ScopeId> = HashSet::new();
        let mut results = Vec::with_capacity(requests.len());

        for (index, request) in requests.iter().enumerate() {
            let result = self.execute_one(index, request, &mut declined).await;
            results.push(result);
        }

        BatchOutcome { results }
    }

    async fn execute_one(
        &self,
        index: usize,
        request: &BatchRequest,
        declined: &mut HashSet<ScopeId>,
    ) -> Result<Value> {
        let error = match self.send(request).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        let Some(remediation) = request.handler_for(&error) else {
            tracing::debug!(index, %error, "request failed without remediation");
            return Err(error);
        };

        match remediation {
            Remediation::RequireScope(scope) => {
                let error = with_scope(error, scope);
                if declined.contains(scope) {
                    return Err(error);
                }

                match self.authorizer.grant_scope(self.prompt, scope).await {
                    Ok(true) => {
                        tracing::debug!(index, %scope, "scope granted, retrying once");
                        self.send(request).await.map_err(|e| with_scope(e, scope))
                    }
                    Ok(false) => {
                        declined.insert(scope.clone());
                        Err(error)
                    }
                    Err(remediation_error) => {
                        warning!(
                            "Could not grant the `{}` permission: {}",
                            scope,
                            remediation_error
                        );
                        declined.insert(scope.clone());
                        Err(error)
                    }
                }
            }
        }
    }

    async fn send(&self, request: &BatchRequest) -> Result<Value> {
        self.client
            .request(
                request.method.clone(),
                &request.endpoint,
                request.body.as_ref(),
            )
            .await
    }
}

fn with_scope(error: Error, required: &ScopeId) -> Error {
    match error {
        Error::AuthScope {
            endpoint,
            scope: None,
        } => Error::AuthScope {
            endpoint,
            scope: Some(required.clone()),
        },
        other => other,
    }
}
