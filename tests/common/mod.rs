#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use chrono::{Duration, Utc};
use serde_json::{Value, json};
use spotcli::{
    config::ApiConfig,
    error::Result,
    management::{CredentialStore, MemoryStore},
    spotify::{AuthorizationPrompt, Authorizer, SpotifyClient},
    types::{ClientIdentity, Credentials},
};
use url::Url;
use wiremock::MockServer;

/// Prompt fake answering from a script and recording what it was asked.
#[derive(Default)]
pub struct ScriptedPrompt {
    confirms: Mutex<VecDeque<bool>>,
    codes: Mutex<VecDeque<Option<String>>>,
    pub questions: Mutex<Vec<String>>,
    pub urls: Mutex<Vec<Url>>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm_with(self, answer: bool) -> Self {
        self.confirms.lock().unwrap().push_back(answer);
        self
    }

    pub fn code(self, code: &str) -> Self {
        self.codes.lock().unwrap().push_back(Some(code.to_string()));
        self
    }

    pub fn abandon(self) -> Self {
        self.codes.lock().unwrap().push_back(None);
        self
    }

    pub fn question_count(&self) -> usize {
        self.questions.lock().unwrap().len()
    }

    pub fn last_url(&self) -> Url {
        self.urls.lock().unwrap().last().cloned().expect("no URL was shown")
    }
}

impl AuthorizationPrompt for ScriptedPrompt {
    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        self.questions.lock().unwrap().push(message.to_string());
        Ok(self.confirms.lock().unwrap().pop_front().unwrap_or(default))
    }

    fn authorize(&self, url: &Url) -> Result<Option<String>> {
        self.urls.lock().unwrap().push(url.clone());
        Ok(self.codes.lock().unwrap().pop_front().flatten())
    }
}

pub fn default_client() -> ClientIdentity {
    ClientIdentity::new("default-id", "default-secret")
}

pub fn config(server: &MockServer) -> ApiConfig {
    ApiConfig::with_base_url(&server.uri()).with_default_client(default_client())
}

pub fn logged_in(access_token: &str) -> Credentials {
    Credentials {
        access_token: Some(access_token.to_string()),
        refresh_token: Some("refresh-token".to_string()),
        expires_at: Some(Utc::now() + Duration::hours(1)),
        ..Credentials::default()
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub authorizer: Arc<Authorizer>,
    pub client: SpotifyClient,
}

pub fn harness(server: &MockServer, credentials: Option<Credentials>) -> Harness {
    let store = Arc::new(match credentials {
        Some(c) => MemoryStore::with_credentials(c),
        None => MemoryStore::new(),
    });
    let dyn_store: Arc<dyn CredentialStore> = store.clone();
    let authorizer = Arc::new(Authorizer::new(config(server), dyn_store));
    let client = SpotifyClient::new(Arc::clone(&authorizer));
    Harness {
        store,
        authorizer,
        client,
    }
}

pub fn token_body(access_token: &str, refresh_token: Option<&str>) -> Value {
    let mut body = json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 3600,
    });
    if let Some(refresh_token) = refresh_token {
        body["refresh_token"] = json!(refresh_token);
    }
    body
}

pub fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
