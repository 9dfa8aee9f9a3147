//! Secret resolution capability
//!
//! The verification secret is looked up on every call through a
//! [`SecretProvider`] so rotation does not need a restart and the handler
//! never depends on where the secret lives.

use std::{collections::HashMap, path::PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum SecretError {
    #[error("secret {0} is not configured")]
    Missing(String),

    #[error("secret {name} could not be read: {source}")]
    Unreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn secret(&self, name: &str) -> Result<String, SecretError>;
}

/// Reads secrets from process environment variables.
#[derive(Debug, Default, Clone)]
pub struct EnvSecretProvider;

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn secret(&self, name: &str) -> Result<String, SecretError> {
        std::env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SecretError::Missing(name.to_string()))
    }
}

/// Reads secrets mounted as files, one file per secret (`<dir>/<name>`).
#[derive(Debug, Clone)]
pub struct FileSecretProvider {
    dir: PathBuf,
}

impl FileSecretProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SecretProvider for FileSecretProvider {
    async fn secret(&self, name: &str) -> Result<String, SecretError> {
        let path = self.dir.join(name);
        let contents = tokio::fs::read_to_string(&path).await.map_err(|source| {
            warn!("Failed to read secret {name} from {:?}", path);
            SecretError::Unreadable {
                name: name.to_string(),
                source,
            }
        })?;

        let value = contents.trim();
        if value.is_empty() {
            return Err(SecretError::Missing(name.to_string()));
        }
        Ok(value.to_string())
    }
}

/// Fixed in-memory secrets.
#[derive(Clone, Default)]
pub struct StaticSecretProvider {
    secrets: HashMap<String, String>,
}

impl StaticSecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

impl std::fmt::Debug for StaticSecretProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSecretProvider")
            .field("names", &self.secrets.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl SecretProvider for StaticSecretProvider {
    async fn secret(&self, name: &str) -> Result<String, SecretError> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| SecretError::Missing(name.to_string()))
    }
}
