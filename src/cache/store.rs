//! Pluggable cache backends
//!
//! A [`CacheStore`] maps a composed cache key to one component message map.
//! [`MemoryStore`] keeps entries in process; [`DiskStore`] writes one JSON
//! file per key so a restarted process can read what was last fetched.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::info::CacheInfo;
use crate::error::Result;

/// Storage backend for component message maps
#[async_trait]
pub trait CacheStore: Send + Sync + std::fmt::Debug {
    /// Message map stored under `key`
    async fn get(&self, key: &str) -> Result<Option<HashMap<String, String>>>;

    /// Store a message map, replacing any previous entry
    async fn put(&self, key: &str, messages: HashMap<String, String>) -> Result<()>;

    /// All stored keys
    async fn keys(&self) -> Result<Vec<String>>;

    /// Remove every entry
    async fn clear(&self) -> Result<()>;

    /// Expiry bookkeeping of one entry
    async fn info(&self, key: &str) -> Result<Option<CacheInfo>>;

    /// Maximum age applied to entries stored from now on
    fn set_expiry(&self, expiry: Duration);

    /// Current maximum age
    fn expiry(&self) -> Duration;
}

/// A stored message map with its bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    info: CacheInfo,
    messages: HashMap<String, String>,
}

impl StoredEntry {
    fn new(key: &str, messages: HashMap<String, String>, age: Duration) -> Self {
        let mut info = CacheInfo::new(age);
        info.touch();
        Self {
            key: key.to_string(),
            info,
            messages,
        }
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// In-process cache store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
    expiry_ms: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<HashMap<String, String>>> {
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .map(|entry| entry.messages.clone()))
    }

    async fn put(&self, key: &str, messages: HashMap<String, String>) -> Result<()> {
        let entry = StoredEntry::new(key, messages, self.expiry());
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn info(&self, key: &str) -> Result<Option<CacheInfo>> {
        Ok(self.entries.read().await.get(key).map(|entry| entry.info))
    }

    fn set_expiry(&self, expiry: Duration) {
        self.expiry_ms
            .store(expiry.as_millis() as u64, Ordering::Relaxed);
    }

    fn expiry(&self) -> Duration {
        Duration::from_millis(self.expiry_ms.load(Ordering::Relaxed))
    }
}

// ============================================================================
// Disk Store
// ============================================================================

/// Cache store writing one JSON file per key under a root directory
#[derive(Debug)]
pub struct DiskStore {
    root: PathBuf,
    expiry_ms: AtomicU64,
}

impl DiskStore {
    /// Create a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "Opened disk cache");

        Ok(Self {
            root,
            expiry_ms: AtomicU64::new(0),
        })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let encoded: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
        self.root.join(format!("{encoded}.json"))
    }

    async fn read_entry(&self, path: &Path) -> Result<Option<StoredEntry>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn entry_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<HashMap<String, String>>> {
        Ok(self
            .read_entry(&self.entry_path(key))
            .await?
            .map(|entry| entry.messages))
    }

    async fn put(&self, key: &str, messages: HashMap<String, String>) -> Result<()> {
        let entry = StoredEntry::new(key, messages, self.expiry());
        let path = self.entry_path(key);
        let tmp = path.with_extension("json.tmp");

        tokio::fs::write(&tmp, serde_json::to_vec(&entry)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for path in self.entry_files().await? {
            match self.read_entry(&path).await {
                Ok(Some(entry)) => keys.push(entry.key),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping corrupt cache file"),
            }
        }
        Ok(keys)
    }

    async fn clear(&self) -> Result<()> {
        for path in self.entry_files().await? {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn info(&self, key: &str) -> Result<Option<CacheInfo>> {
        Ok(self
            .read_entry(&self.entry_path(key))
            .await?
            .map(|entry| entry.info))
    }

    fn set_expiry(&self, expiry: Duration) {
        self.expiry_ms
            .store(expiry.as_millis() as u64, Ordering::Relaxed);
    }

    fn expiry(&self) -> Duration {
        Duration::from_millis(self.expiry_ms.load(Ordering::Relaxed))
    }
}
