//! Remote server data source
//!
//! A full fetch lists the server's locales and components, then fetches every
//! (locale, component) pair. A pair that fails is logged and skipped; a
//! failing list call fails the whole fetch.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{DataSource, SourceStatus, SourceType};
use crate::client::RemoteFetcher;
use crate::config::ProductConfig;
use crate::error::{Error, Result};
use crate::models::{ComponentData, ProductData};

/// Server data source of one product
pub struct ServerDataSource {
    config: Arc<ProductConfig>,
    fetcher: Option<Arc<dyn RemoteFetcher>>,
}

impl std::fmt::Debug for ServerDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerDataSource")
            .field("product", &self.config.product_name)
            .field("server_url", &self.config.server_url)
            .field("has_fetcher", &self.fetcher.is_some())
            .finish()
    }
}

impl ServerDataSource {
    /// Create a server source; without a fetcher the source is not applicable
    pub fn new(config: Arc<ProductConfig>, fetcher: Option<Arc<dyn RemoteFetcher>>) -> Self {
        Self { config, fetcher }
    }

    fn fetcher(&self) -> Result<&Arc<dyn RemoteFetcher>> {
        match &self.fetcher {
            Some(fetcher) if self.config.has_server() => Ok(fetcher),
            _ => Err(Error::config(format!(
                "no server_url configured for product '{}'",
                self.config.product_name
            ))),
        }
    }
}

#[async_trait]
impl DataSource for ServerDataSource {
    fn source_type(&self) -> SourceType {
        SourceType::Server
    }

    async fn status(&self) -> SourceStatus {
        if self.config.has_server() && self.fetcher.is_some() {
            SourceStatus::Ready
        } else {
            SourceStatus::NotApplicable
        }
    }

    async fn get_product_translation(&self) -> Result<Option<ProductData>> {
        let fetcher = self.fetcher()?;
        let product = &self.config.product_name;

        let locales = fetcher.fetch_locales_list().await?;
        let components = fetcher.fetch_components_list().await?;
        info!(
            product = %product,
            locales = locales.len(),
            components = components.len(),
            "Fetching product translation from server"
        );

        let pairs: Vec<(String, String)> = locales
            .iter()
            .flat_map(|locale| {
                components
                    .iter()
                    .map(move |component| (locale.clone(), component.clone()))
            })
            .collect();
        let total = pairs.len();

        let results: Vec<_> = stream::iter(pairs)
            .map(|(locale, component)| async move {
                let result = fetcher.fetch_component_messages(&locale, &component).await;
                (locale, component, result)
            })
            .buffer_unordered(self.config.fetch_concurrency.max(1))
            .collect()
            .await;

        let mut data = ProductData::new(product, &self.config.version);
        let mut failed = 0usize;
        for (locale, component, result) in results {
            match result {
                Ok(messages) => {
                    data.insert_component(&locale, ComponentData::with_messages(component, messages));
                }
                Err(e) => {
                    failed += 1;
                    warn!(
                        product = %product,
                        locale = %locale,
                        component = %component,
                        error = %e,
                        "Skipping component that failed to fetch"
                    );
                }
            }
        }

        debug!(product = %product, total, failed, "Server fetch finished");
        Ok(if data.is_empty() { None } else { Some(data) })
    }

    async fn get_component_translation(
        &self,
        locale: &str,
        component: &str,
    ) -> Result<Option<ComponentData>> {
        let messages = self
            .fetcher()?
            .fetch_component_messages(locale, component)
            .await?;
        Ok(Some(ComponentData::with_messages(component, messages)))
    }

    async fn set_product_translation(&self, _data: &ProductData) -> Result<()> {
        Ok(())
    }

    async fn refresh_data(&self, _delta: &ProductData) -> Result<()> {
        Ok(())
    }

    async fn locale_list(&self) -> Result<BTreeSet<String>> {
        Ok(self.fetcher()?.fetch_locales_list().await?.into_iter().collect())
    }

    async fn component_list(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .fetcher()?
            .fetch_components_list()
            .await?
            .into_iter()
            .collect())
    }
}
