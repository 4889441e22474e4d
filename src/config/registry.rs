//! Per-product configuration registry
//!
//! Configurations are registered once per product name and shared as
//! `Arc<ProductConfig>` from then on.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::ProductConfig;
use crate::error::{Error, Result};

/// Registry of product configurations keyed by product name
#[derive(Debug, Default)]
pub struct ConfigRegistry {
    configs: RwLock<HashMap<String, Arc<ProductConfig>>>,
}

impl ConfigRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a configuration
    ///
    /// The first registration for a product name wins; later calls return the
    /// existing entry unchanged.
    pub async fn register(&self, config: ProductConfig) -> Result<Arc<ProductConfig>> {
        config.validate()?;

        let mut configs = self.configs.write().await;
        if let Some(existing) = configs.get(&config.product_name) {
            debug!(
                product = %config.product_name,
                "Product already registered, keeping first configuration"
            );
            return Ok(Arc::clone(existing));
        }

        info!(
            product = %config.product_name,
            version = %config.version,
            server = config.has_server(),
            bundle = config.has_bundle(),
            "Registered product configuration"
        );

        let name = config.product_name.clone();
        let config = Arc::new(config);
        configs.insert(name, Arc::clone(&config));
        Ok(config)
    }

    /// Register several configurations, stopping at the first invalid one
    pub async fn register_all(
        &self,
        configs: impl IntoIterator<Item = ProductConfig>,
    ) -> Result<Vec<Arc<ProductConfig>>> {
        let mut registered = Vec::new();
        for config in configs {
            registered.push(self.register(config).await?);
        }
        Ok(registered)
    }

    /// Look up a configuration by product name
    pub async fn get(&self, product_name: &str) -> Option<Arc<ProductConfig>> {
        self.configs.read().await.get(product_name).cloned()
    }

    /// Look up a configuration, failing with [`Error::UnknownProduct`]
    pub async fn require(&self, product_name: &str) -> Result<Arc<ProductConfig>> {
        self.get(product_name)
            .await
            .ok_or_else(|| Error::UnknownProduct(product_name.to_string()))
    }

    /// Registered product names, sorted
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered products
    pub async fn len(&self) -> usize {
        self.configs.read().await.len()
    }

    /// Whether no product is registered
    pub async fn is_empty(&self) -> bool {
        self.configs.read().await.is_empty()
    }
}
