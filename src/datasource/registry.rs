//! Per-product manager registry
//!
//! [`ClientContext`] is the application-owned root object: it holds the
//! product configurations and hands out exactly one [`DataSourceManager`] per
//! product name, warming it up and starting its synchronizer on first use.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::info;

use super::DataSourceManager;
use crate::client::{http_fetcher_factory, FetcherFactory};
use crate::config::{ConfigRegistry, ProductConfig};
use crate::error::Result;
use crate::scheduler::DataSynchronizer;

type ManagerCell = Arc<OnceCell<Arc<DataSourceManager>>>;

/// Registry of configurations and data source managers
pub struct ClientContext {
    configs: ConfigRegistry,
    fetcher_factory: FetcherFactory,
    managers: RwLock<HashMap<String, ManagerCell>>,
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("configs", &self.configs)
            .finish_non_exhaustive()
    }
}

impl Default for ClientContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientContext {
    /// Create a context using the HTTP fetcher for server-backed products
    pub fn new() -> Self {
        Self::with_fetcher_factory(http_fetcher_factory())
    }

    /// Create a context with a custom remote fetcher factory
    pub fn with_fetcher_factory(fetcher_factory: FetcherFactory) -> Self {
        Self {
            configs: ConfigRegistry::new(),
            fetcher_factory,
            managers: RwLock::new(HashMap::new()),
        }
    }

    /// Configuration registry
    pub fn configs(&self) -> &ConfigRegistry {
        &self.configs
    }

    /// Register a product configuration (first registration wins)
    pub async fn register(&self, config: ProductConfig) -> Result<Arc<ProductConfig>> {
        self.configs.register(config).await
    }

    /// Manager of a registered product, created and warmed up on first call
    ///
    /// Concurrent first calls for the same product share one creation; calls
    /// for different products proceed independently. If warm-up fails the
    /// error is returned and the next call tries again.
    pub async fn manager(&self, product_name: &str) -> Result<Arc<DataSourceManager>> {
        let config = self.configs.require(product_name).await?;
        let cell = self.cell(product_name).await;

        let manager = cell
            .get_or_try_init(|| self.create_manager(Arc::clone(&config)))
            .await?;
        Ok(Arc::clone(manager))
    }

    /// Register a configuration and return its manager
    pub async fn get_or_create(&self, config: ProductConfig) -> Result<Arc<DataSourceManager>> {
        let config = self.register(config).await?;
        self.manager(&config.product_name).await
    }

    /// Names of products whose manager has been created
    pub async fn active_products(&self) -> Vec<String> {
        let managers = self.managers.read().await;
        let mut names: Vec<String> = managers
            .iter()
            .filter(|(_, cell)| cell.initialized())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Fetch or insert the creation cell of a product
    async fn cell(&self, product_name: &str) -> ManagerCell {
        if let Some(cell) = self.managers.read().await.get(product_name) {
            return Arc::clone(cell);
        }

        let mut managers = self.managers.write().await;
        Arc::clone(
            managers
                .entry(product_name.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    async fn create_manager(&self, config: Arc<ProductConfig>) -> Result<Arc<DataSourceManager>> {
        let fetcher = if config.has_server() {
            Some((self.fetcher_factory)(&config)?)
        } else {
            None
        };

        let manager = Arc::new(DataSourceManager::new(Arc::clone(&config), fetcher).await?);
        manager.init_cache().await?;
        DataSynchronizer::start(&manager);

        info!(product = %config.product_name, "Data source manager ready");
        Ok(manager)
    }
}
