use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    config,
    error::Result,
    types::{CredentialField, Credentials},
};

/// Persistent home of the single credential record.
///
/// Writes replace the whole record at once; there is no multi-field
/// transaction beyond that. Concurrent writers follow last-write-wins.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the stored record, or `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<Credentials>>;

    /// Atomically replaces the stored record.
    async fn replace(&self, credentials: &Credentials) -> Result<()>;

    /// Merges `fields` into the stored record, creating it if absent.
    ///
    /// Fields not named in the update keep their stored value.
    async fn save(&self, fields: Vec<CredentialField>) -> Result<Credentials> {
        let mut credentials = self.load().await?.unwrap_or_default();
        for field in fields {
            credentials.apply(field);
        }
        self.replace(&credentials).await?;
        Ok(credentials)
    }
}

/// JSON file store, by default at `<data_local_dir>/spotcli/credentials.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credentials.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new(config::credentials_path())
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn load(&self) -> Result<Option<Credentials>> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let credentials: Credentials = serde_json::from_str(&content)?;
        Ok(Some(credentials))
    }

    async fn replace(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(credentials)?;
        let tmp = self.temp_path();
        async_fs::write(&tmp, json).await?;
        async_fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), "credentials saved");
        Ok(())
    }
}

/// In-process store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<Credentials>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            record: Mutex::new(Some(credentials)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn load(&self) -> Result<Option<Credentials>> {
        Ok(self.record.lock().await.clone())
    }

    async fn replace(&self, credentials: &Credentials) -> Result<()> {
        *self.record.lock().await = Some(credentials.clone());
        Ok(())
    }
}
