//! In-memory cache data source
//!
//! Holds the current snapshot of a product's translations. Writers build a new
//! snapshot and swap it in under the write lock, so readers see either the old
//! or the new data in full. Writers are serialized by a per-source mutex.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::{DataSource, SourceStatus, SourceType};
use crate::cache::{CacheInfo, CacheKey, TranslationCache};
use crate::config::ProductConfig;
use crate::error::Result;
use crate::metrics;
use crate::models::{ComponentData, ProductData};

/// Immutable view of the cached data
#[derive(Debug)]
struct Snapshot {
    data: Arc<ProductData>,
    locales: BTreeSet<String>,
    components: BTreeSet<String>,
    info: CacheInfo,
}

/// Cache data source of one product
#[derive(Debug)]
pub struct CacheDataSource {
    config: Arc<ProductConfig>,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    refresh_lock: Mutex<()>,
    translations: Option<TranslationCache>,
}

impl CacheDataSource {
    /// Create the cache source for a product
    ///
    /// The keyed component cache is only opened when caching is enabled.
    pub async fn new(config: Arc<ProductConfig>) -> Result<Self> {
        let translations = if config.enable_cache {
            Some(TranslationCache::from_config(&config).await?)
        } else {
            None
        };

        Ok(Self {
            config,
            snapshot: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            translations,
        })
    }

    /// Current snapshot data without copying it
    pub async fn product_snapshot(&self) -> Option<Arc<ProductData>> {
        self.snapshot
            .read()
            .await
            .as_ref()
            .map(|snapshot| Arc::clone(&snapshot.data))
    }

    /// Whether a resync is due; a cache that never synced is expired
    pub async fn is_expired(&self) -> bool {
        self.snapshot
            .read()
            .await
            .as_ref()
            .map_or(true, |snapshot| snapshot.info.is_expired())
    }

    /// Time of the last successful set or refresh
    pub async fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.snapshot
            .read()
            .await
            .as_ref()
            .and_then(|snapshot| snapshot.info.last_update)
    }

    /// Keyed component cache, if caching is enabled
    pub fn translation_cache(&self) -> Option<&TranslationCache> {
        self.translations.as_ref()
    }

    /// Look up a component message map by composed cache key
    pub async fn get_by_key(&self, key: &str) -> Result<Option<HashMap<String, String>>> {
        match &self.translations {
            Some(cache) => cache.get_component(key).await,
            None => Ok(None),
        }
    }

    /// Keyed entry of one (locale, component) pair with its expiry bookkeeping
    pub async fn get_keyed(
        &self,
        locale: &str,
        component: &str,
    ) -> Result<Option<(HashMap<String, String>, Option<CacheInfo>)>> {
        let Some(cache) = &self.translations else {
            return Ok(None);
        };

        let key = CacheKey::compose(
            &self.config.product_name,
            &self.config.version,
            Some(component),
            self.config.pseudo,
            Some(locale),
        );
        match cache.get_component(&key).await? {
            Some(messages) => Ok(Some((messages, cache.info(&key).await?))),
            None => Ok(None),
        }
    }

    fn build_snapshot(
        &self,
        data: Arc<ProductData>,
        mut locales: BTreeSet<String>,
        mut components: BTreeSet<String>,
    ) -> Snapshot {
        locales.extend(data.locale_tags());
        components.extend(data.component_names());

        let mut info = CacheInfo::new(self.config.cache_expiry());
        info.touch();

        Snapshot {
            data,
            locales,
            components,
            info,
        }
    }

    /// Mirror component maps into the keyed cache
    ///
    /// With `replace`, entries of pairs missing from `data` are dropped first.
    async fn publish(&self, data: &ProductData, replace: bool) {
        let Some(cache) = &self.translations else {
            return;
        };

        if replace {
            if let Err(e) = cache.clear().await {
                warn!(
                    product = %self.config.product_name,
                    error = %e,
                    "Failed to clear component cache"
                );
            }
        }

        if let Err(e) = cache.publish(data, self.config.pseudo).await {
            warn!(
                product = %self.config.product_name,
                error = %e,
                "Failed to publish component cache"
            );
        }
    }
}

#[async_trait]
impl DataSource for CacheDataSource {
    fn source_type(&self) -> SourceType {
        SourceType::Cache
    }

    async fn status(&self) -> SourceStatus {
        if !self.config.enable_cache {
            SourceStatus::NotApplicable
        } else if self.snapshot.read().await.is_some() {
            SourceStatus::Ready
        } else {
            SourceStatus::Uninitialized
        }
    }

    async fn get_product_translation(&self) -> Result<Option<ProductData>> {
        Ok(self.product_snapshot().await.map(|data| (*data).clone()))
    }

    async fn get_component_translation(
        &self,
        locale: &str,
        component: &str,
    ) -> Result<Option<ComponentData>> {
        let found = self
            .product_snapshot()
            .await
            .and_then(|data| data.component(locale, component).cloned());

        metrics::record_cache_lookup(&self.config.product_name, found.is_some());
        Ok(found)
    }

    async fn set_product_translation(&self, data: &ProductData) -> Result<()> {
        if !self.config.enable_cache {
            return Ok(());
        }

        let _guard = self.refresh_lock.lock().await;

        let snapshot = self.build_snapshot(Arc::new(data.clone()), BTreeSet::new(), BTreeSet::new());
        debug!(
            product = %self.config.product_name,
            locales = snapshot.locales.len(),
            components = snapshot.components.len(),
            "Replacing cache snapshot"
        );
        *self.snapshot.write().await = Some(Arc::new(snapshot));

        self.publish(data, true).await;
        Ok(())
    }

    async fn refresh_data(&self, delta: &ProductData) -> Result<()> {
        if !self.config.enable_cache {
            return Ok(());
        }

        let _guard = self.refresh_lock.lock().await;

        let current = self.snapshot.read().await.clone();
        let snapshot = match current {
            Some(current) => {
                let mut merged = (*current.data).clone();
                merged.merge(delta);
                self.build_snapshot(
                    Arc::new(merged),
                    current.locales.clone(),
                    current.components.clone(),
                )
            }
            None => self.build_snapshot(Arc::new(delta.clone()), BTreeSet::new(), BTreeSet::new()),
        };

        debug!(
            product = %self.config.product_name,
            pairs = delta.pair_count(),
            "Merged data into cache snapshot"
        );
        *self.snapshot.write().await = Some(Arc::new(snapshot));

        self.publish(delta, false).await;
        Ok(())
    }

    async fn locale_list(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .snapshot
            .read()
            .await
            .as_ref()
            .map(|snapshot| snapshot.locales.clone())
            .unwrap_or_default())
    }

    async fn component_list(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .snapshot
            .read()
            .await
            .as_ref()
            .map(|snapshot| snapshot.components.clone())
            .unwrap_or_default())
    }
}
