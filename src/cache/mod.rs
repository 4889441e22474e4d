//! Translation caching layer
//!
//! This module provides the keyed component cache behind a product:
//! - Key composition: `{product}_{version}_{component}_{pseudo}_#{locale}`
//! - Pluggable backends: in-memory map or one JSON file per key
//! - Expiry bookkeeping used to decide when a resync is due
//!
//! # Example
//!
//! ```rust,ignore
//! use transync::cache::{CacheKey, TranslationCache};
//!
//! let cache = TranslationCache::from_config(&config).await?;
//! let key = CacheKey::compose("Acme", "1.0.0", Some("greeting"), false, Some("fr"));
//! let messages = cache.get_component(&key).await?;
//! ```

pub mod info;
pub mod key;
pub mod store;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::{CacheMode, ProductConfig};
use crate::error::{Error, Result};
use crate::metrics;
use crate::models::ProductData;

pub use info::CacheInfo;
pub use key::CacheKey;
pub use store::{CacheStore, DiskStore, MemoryStore};

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
}

impl CacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Keyed component cache of one product
#[derive(Debug)]
pub struct TranslationCache {
    product: String,
    store: Arc<dyn CacheStore>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TranslationCache {
    /// Create a cache over an existing store
    pub fn new(product: impl Into<String>, store: Arc<dyn CacheStore>) -> Self {
        Self {
            product: product.into(),
            store,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create the cache a product configuration asks for
    pub async fn from_config(config: &ProductConfig) -> Result<Self> {
        let store: Arc<dyn CacheStore> = match config.cache_mode {
            CacheMode::Memory => Arc::new(MemoryStore::new()),
            CacheMode::Disk => {
                let path = config.cache_path.as_ref().ok_or_else(|| {
                    Error::config(format!(
                        "cache_path is required for disk cache mode (product '{}')",
                        config.product_name
                    ))
                })?;
                Arc::new(DiskStore::open(path).await?)
            }
        };
        store.set_expiry(config.cache_expiry());

        Ok(Self::new(config.product_name.clone(), store))
    }

    // =========================================================================
    // Component Cache
    // =========================================================================

    /// Get the message map stored under `key`
    pub async fn get_component(&self, key: &str) -> Result<Option<HashMap<String, String>>> {
        let found = self.store.get(key).await?;

        let hit = found.is_some();
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        metrics::record_cache_lookup(&self.product, hit);

        Ok(found)
    }

    /// Store the message map of one component
    pub async fn put_component(&self, key: &str, messages: HashMap<String, String>) -> Result<()> {
        self.store.put(key, messages).await
    }

    /// Store every (locale, component) pair of `data`, returning how many were written
    pub async fn publish(&self, data: &ProductData, pseudo: bool) -> Result<usize> {
        let mut written = 0;
        for (locale, component) in data.pairs() {
            let key = CacheKey::compose(
                data.product_name(),
                data.version_name(),
                Some(component.name()),
                pseudo,
                Some(locale),
            );
            self.store.put(&key, component.messages().clone()).await?;
            written += 1;
        }

        tracing::debug!(product = %self.product, entries = written, "Published component cache");
        Ok(written)
    }

    // =========================================================================
    // Bookkeeping
    // =========================================================================

    /// Expiry bookkeeping of one entry
    pub async fn info(&self, key: &str) -> Result<Option<CacheInfo>> {
        self.store.info(key).await
    }

    /// Remove every entry
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }

    /// Hit/miss counters since creation
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Backing store
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }
}
