//! Per-product orchestration of the data sources
//!
//! Warm-up walks an explicit fallback list (server, then bundle) and stores
//! the first non-empty result in the cache. After warm-up every read is served
//! from the cache; server and bundle are only touched by warm-up, resync and
//! explicit backfill.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::{
    BundleDataSource, CacheDataSource, DataSource, ServerDataSource, SourceStatus, SourceType,
};
use crate::cache::CacheInfo;
use crate::client::RemoteFetcher;
use crate::config::ProductConfig;
use crate::error::{Error, Result};
use crate::metrics;
use crate::models::{ComponentData, ProductData};

/// Entry point for one product's translations
#[derive(Debug)]
pub struct DataSourceManager {
    config: Arc<ProductConfig>,
    cache: CacheDataSource,
    bundle: BundleDataSource,
    server: ServerDataSource,
}

impl DataSourceManager {
    /// Create a manager with the default bundle store
    ///
    /// `fetcher` is only used when the configuration names a server.
    pub async fn new(
        config: Arc<ProductConfig>,
        fetcher: Option<Arc<dyn RemoteFetcher>>,
    ) -> Result<Self> {
        let cache = CacheDataSource::new(Arc::clone(&config)).await?;
        let bundle = BundleDataSource::new(Arc::clone(&config));
        let server = ServerDataSource::new(Arc::clone(&config), fetcher);

        Ok(Self::with_sources(config, cache, bundle, server))
    }

    /// Create a manager over prepared sources
    pub fn with_sources(
        config: Arc<ProductConfig>,
        cache: CacheDataSource,
        bundle: BundleDataSource,
        server: ServerDataSource,
    ) -> Self {
        Self {
            config,
            cache,
            bundle,
            server,
        }
    }

    /// Product configuration
    pub fn config(&self) -> &Arc<ProductConfig> {
        &self.config
    }

    /// Product name
    pub fn product_name(&self) -> &str {
        &self.config.product_name
    }

    /// Cache source
    pub fn cache(&self) -> &CacheDataSource {
        &self.cache
    }

    /// Bundle source
    pub fn bundle(&self) -> &BundleDataSource {
        &self.bundle
    }

    /// Server source
    pub fn server(&self) -> &ServerDataSource {
        &self.server
    }

    /// Sources consulted by warm-up, in order
    pub fn fallback_order(&self) -> [&dyn DataSource; 2] {
        [&self.server, &self.bundle]
    }

    // =========================================================================
    // Warm-up and Resync
    // =========================================================================

    /// Populate the cache from the first source that has data
    ///
    /// A no-op when caching is disabled or `initialize_cache` is off.
    ///
    /// # Errors
    ///
    /// Returns `Error::InitializationFailed` if no source produced data; the
    /// cache is left as it was.
    pub async fn init_cache(&self) -> Result<()> {
        if !self.config.enable_cache || !self.config.initialize_cache {
            debug!(product = %self.product_name(), "Cache warm-up disabled");
            return Ok(());
        }

        info!(product = %self.product_name(), "Initializing translation cache");
        self.load_from_sources().await.map(|_| ())
    }

    /// Re-run the fallback chain, logging instead of returning failures
    ///
    /// Returns whether the cache was refreshed.
    pub async fn sync_cache(&self) -> bool {
        if !self.config.enable_cache {
            return false;
        }

        match self.load_from_sources().await {
            Ok(source) => {
                info!(product = %self.product_name(), source = %source, "Cache synchronized");
                metrics::record_sync(self.product_name(), true);
                true
            }
            Err(e) => {
                warn!(
                    product = %self.product_name(),
                    error = %e,
                    "Cache synchronization failed, keeping current data"
                );
                metrics::record_sync(self.product_name(), false);
                false
            }
        }
    }

    /// Walk the fallback list and install the first non-empty result
    async fn load_from_sources(&self) -> Result<SourceType> {
        let started = Instant::now();
        let product = self.product_name();

        for source in self.fallback_order() {
            let source_type = source.source_type();
            if source.status().await != SourceStatus::Ready {
                debug!(product = %product, source = %source_type, "Source not applicable, skipping");
                continue;
            }

            let data = match source.get_product_translation().await {
                Ok(Some(data)) if !data.is_empty() => data,
                Ok(_) => {
                    debug!(product = %product, source = %source_type, "Source returned no data");
                    continue;
                }
                Err(e) => {
                    warn!(
                        product = %product,
                        source = %source_type,
                        error = %e,
                        "Source failed, trying next"
                    );
                    continue;
                }
            };

            // A resync merges, so pairs a partial fetch skipped stay cached
            if self.cache.status().await.is_ready() {
                self.cache.refresh_data(&data).await?;
            } else {
                self.cache.set_product_translation(&data).await?;
            }

            if source_type == SourceType::Server && self.bundle.status().await.is_ready() {
                self.bundle.set_product_translation(&data).await?;
            }

            info!(
                product = %product,
                source = %source_type,
                locales = data.locale_tags().len(),
                components = data.component_names().len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Loaded translation data"
            );
            metrics::record_warm_up(product, source_type.as_str(), started.elapsed().as_secs_f64());
            return Ok(source_type);
        }

        error!(product = %product, "No source returned translation data");
        metrics::record_warm_up(product, "failed", started.elapsed().as_secs_f64());
        Err(Error::InitializationFailed {
            product: product.to_string(),
        })
    }

    /// Whether the cached data is due for a resync
    pub async fn is_expired(&self) -> bool {
        self.cache.is_expired().await
    }

    // =========================================================================
    // Reads (cache only)
    // =========================================================================

    /// Full cached product data
    pub async fn get_product_translation(&self) -> Option<Arc<ProductData>> {
        self.cache.product_snapshot().await
    }

    /// Cached messages of one component
    pub async fn get_component_translation(
        &self,
        locale: &str,
        component: &str,
    ) -> Option<ComponentData> {
        match self.cache.get_component_translation(locale, component).await {
            Ok(found) => found,
            Err(e) => {
                warn!(product = %self.product_name(), error = %e, "Cache read failed");
                None
            }
        }
    }

    /// Message map of one component, as a plain map
    pub async fn get_component_messages(
        &self,
        locale: &str,
        component: &str,
    ) -> Option<HashMap<String, String>> {
        self.get_component_translation(locale, component)
            .await
            .map(ComponentData::into_messages)
    }

    /// Message map of one component read through the keyed cache, with the
    /// entry's expiry bookkeeping
    pub async fn cached_entry(
        &self,
        locale: &str,
        component: &str,
    ) -> Option<(HashMap<String, String>, Option<CacheInfo>)> {
        match self.cache.get_keyed(locale, component).await {
            Ok(found) => found,
            Err(e) => {
                warn!(product = %self.product_name(), error = %e, "Keyed cache read failed");
                None
            }
        }
    }

    /// One translated string
    ///
    /// When the key is missing from `locale`, the configured fallback chain is
    /// tried from the entry after `locale` (or from the start if `locale` is
    /// not in the chain).
    pub async fn get_message(&self, locale: &str, component: &str, key: &str) -> Option<String> {
        let data = self.cache.product_snapshot().await?;
        let lookup = |tag: &str| data.component(tag, component)?.get(key).map(str::to_string);

        if let Some(found) = lookup(locale) {
            return Some(found);
        }

        let chain = &self.config.fallback_locales;
        let start = chain
            .iter()
            .position(|l| l.eq_ignore_ascii_case(locale))
            .map_or(0, |index| index + 1);

        chain[start..].iter().find_map(|fallback| {
            let found = lookup(fallback)?;
            warn!(
                product = %self.product_name(),
                locale = %locale,
                fallback = %fallback,
                component = %component,
                key = %key,
                "Falling back to locale"
            );
            Some(found)
        })
    }

    /// Locales held by the cache
    pub async fn locale_list(&self) -> BTreeSet<String> {
        self.cache.locale_list().await.unwrap_or_default()
    }

    /// Components held by the cache
    pub async fn component_list(&self) -> BTreeSet<String> {
        self.cache.component_list().await.unwrap_or_default()
    }

    // =========================================================================
    // Backfill
    // =========================================================================

    /// Merge externally obtained data into the cache and the bundle mirror
    pub async fn backfill(&self, delta: &ProductData) -> Result<()> {
        if delta.is_empty() {
            return Ok(());
        }

        self.cache.refresh_data(delta).await?;
        if self.bundle.status().await.is_ready() {
            self.bundle.refresh_data(delta).await?;
        }

        debug!(product = %self.product_name(), pairs = delta.pair_count(), "Backfilled data");
        Ok(())
    }

    /// Fetch one component through the fallback list and backfill it
    ///
    /// Meant for explicit, off-request refreshes; reads never call this.
    pub async fn backfill_component(
        &self,
        locale: &str,
        component: &str,
    ) -> Result<Option<ComponentData>> {
        for source in self.fallback_order() {
            if !source.status().await.is_ready() {
                continue;
            }

            match source.get_component_translation(locale, component).await {
                Ok(Some(found)) => {
                    let mut delta =
                        ProductData::new(&self.config.product_name, &self.config.version);
                    delta.insert_component(locale, found.clone());

                    // Bundle data does not need writing back to the bundle
                    self.cache.refresh_data(&delta).await?;
                    if source.source_type() == SourceType::Server {
                        self.bundle.refresh_data(&delta).await?;
                    }
                    return Ok(Some(found));
                }
                Ok(None) => {}
                Err(e) => warn!(
                    product = %self.product_name(),
                    source = %source.source_type(),
                    locale = %locale,
                    component = %component,
                    error = %e,
                    "Component backfill failed, trying next"
                ),
            }
        }

        Ok(None)
    }
}
