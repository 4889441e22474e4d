//! Local bundle data source
//!
//! Reads the product's bundle folder as a fallback when the server cannot be
//! reached, and mirrors server data back into it for offline use. Writes are
//! best-effort: failures are logged and never returned.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{DataSource, SourceStatus, SourceType};
use crate::config::ProductConfig;
use crate::error::{Error, Result};
use crate::models::{ComponentData, ProductData};
use crate::storage::{BundleIo, FsBundleIo};

/// Bundle data source of one product
pub struct BundleDataSource {
    config: Arc<ProductConfig>,
    io: Arc<dyn BundleIo>,
}

impl std::fmt::Debug for BundleDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleDataSource")
            .field("product", &self.config.product_name)
            .field("bundle_folder", &self.config.bundle_folder)
            .finish()
    }
}

impl BundleDataSource {
    /// Create a bundle source backed by the local filesystem
    pub fn new(config: Arc<ProductConfig>) -> Self {
        Self::with_io(config, Arc::new(FsBundleIo::new()))
    }

    /// Create a bundle source over a custom bundle store
    pub fn with_io(config: Arc<ProductConfig>, io: Arc<dyn BundleIo>) -> Self {
        Self { config, io }
    }

    /// Configured bundle root, if any
    pub fn root(&self) -> Option<&Path> {
        self.config
            .bundle_folder
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    fn require_root(&self) -> Result<PathBuf> {
        self.root().map(Path::to_path_buf).ok_or_else(|| {
            Error::config(format!(
                "no bundle_folder configured for product '{}'",
                self.config.product_name
            ))
        })
    }

    /// Read every bundle file into one product
    async fn read_product(&self) -> Result<ProductData> {
        let root = self.require_root()?;
        let entries = self.io.read_all(&root, self.config.bundle_format).await?;

        let mut data = ProductData::new(&self.config.product_name, &self.config.version);
        for entry in entries {
            data.insert_component(
                &entry.locale,
                ComponentData::with_messages(entry.component, entry.messages),
            );
        }
        Ok(data)
    }

    /// Write one file per (locale, component) pair, logging failures
    async fn write_product(&self, data: &ProductData) {
        let Some(root) = self.root() else {
            return;
        };

        let mut written = 0usize;
        for (locale, component) in data.pairs() {
            let result = self
                .io
                .write(
                    root,
                    component.name(),
                    locale,
                    component.messages(),
                    self.config.bundle_format,
                )
                .await;

            match result {
                Ok(()) => written += 1,
                Err(e) => warn!(
                    product = %self.config.product_name,
                    locale = %locale,
                    component = %component.name(),
                    error = %e,
                    "Failed to write bundle file"
                ),
            }
        }

        debug!(
            product = %self.config.product_name,
            written,
            total = data.pair_count(),
            "Mirrored data into bundle folder"
        );
    }
}

#[async_trait]
impl DataSource for BundleDataSource {
    fn source_type(&self) -> SourceType {
        SourceType::Bundle
    }

    async fn status(&self) -> SourceStatus {
        if self.root().is_some() {
            SourceStatus::Ready
        } else {
            SourceStatus::NotApplicable
        }
    }

    async fn get_product_translation(&self) -> Result<Option<ProductData>> {
        let data = self.read_product().await?;
        Ok(if data.is_empty() { None } else { Some(data) })
    }

    async fn get_component_translation(
        &self,
        locale: &str,
        component: &str,
    ) -> Result<Option<ComponentData>> {
        let root = self.require_root()?;
        let messages = self.io
            .read_one(&root, component, locale, self.config.bundle_format)
            .await?;
        Ok(messages.map(|m| ComponentData::with_messages(component, m)))
    }

    async fn set_product_translation(&self, data: &ProductData) -> Result<()> {
        self.write_product(data).await;
        Ok(())
    }

    async fn refresh_data(&self, delta: &ProductData) -> Result<()> {
        self.write_product(delta).await;
        Ok(())
    }

    async fn locale_list(&self) -> Result<BTreeSet<String>> {
        Ok(self.read_product().await?.locale_tags())
    }

    async fn component_list(&self) -> Result<BTreeSet<String>> {
        Ok(self.read_product().await?.component_names())
    }
}
