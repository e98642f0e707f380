//! Bearer-token session storage.
//!
//! The token lives in an external key-value [`TokenStorage`] and is cached in
//! memory. The cache is filled once when the store is opened; changes made to
//! the persisted key by another process are not observed until the next open.

use crate::{Result, RouteError};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// External key-value store that persists the session token.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Read the value stored under `key`.
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Store `token` under `key`, replacing any previous value.
    async fn store(&self, key: &str, token: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-process storage; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage that already holds a token.
    pub fn with_token(key: impl Into<String>, token: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.values.lock().insert(key.into(), token.into());
        storage
    }

    /// Read a value without going through the trait.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }
}

#[async_trait]
impl TokenStorage for MemoryStorage {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.peek(key))
    }

    async fn store(&self, key: &str, token: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), token.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// JSON-file storage: `{ "<key>": "<token>" }`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Use the file at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<HashMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(HashMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                RouteError::Storage(format!("{} is not a session file: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_map(&self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(map)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl TokenStorage for FileStorage {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map().await?.remove(key))
    }

    async fn store(&self, key: &str, token: &str) -> Result<()> {
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), token.to_string());
        self.write_map(&map).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.read_map().await?;
        if map.remove(key).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}

/// The single optional bearer token of a client.
///
/// The token is only ever replaced wholesale: absent, set, cleared.
pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    key: String,
    token: RwLock<Option<String>>,
}

impl SessionStore {
    /// Open the store, reading the persisted token once.
    pub async fn open(storage: Arc<dyn TokenStorage>, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let token = storage
            .load(&key)
            .await?
            .filter(|token| !token.is_empty());
        debug!(key = %key, present = token.is_some(), "Session store opened");

        Ok(Self {
            storage,
            key,
            token: RwLock::new(token),
        })
    }

    /// Current token, if any.
    pub fn get(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Check if a token is held.
    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    /// Persisted key name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace the token. Storage is written first; on failure the cached
    /// token is left unchanged.
    pub async fn set(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        self.storage.store(&self.key, &token).await?;
        *self.token.write() = Some(token);
        debug!(key = %self.key, "Session token stored");
        Ok(())
    }

    /// Drop the token from storage and cache.
    pub async fn clear(&self) -> Result<()> {
        self.storage.remove(&self.key).await?;
        *self.token.write() = None;
        debug!(key = %self.key, "Session token cleared");
        Ok(())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("key", &self.key)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
