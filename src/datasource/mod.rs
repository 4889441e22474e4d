//! Translation data sources
//!
//! A product's translations can come from three places, each behind the
//! [`DataSource`] trait:
//!
//! - [`CacheDataSource`]: in-memory snapshot serving every read
//! - [`BundleDataSource`]: local bundle files, fallback and offline mirror
//! - [`ServerDataSource`]: the remote translation service
//!
//! [`DataSourceManager`] orders them and owns warm-up and resync;
//! [`ClientContext`] hands out one manager per product.

pub mod bundle;
pub mod cache;
pub mod manager;
pub mod registry;
pub mod server;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::Result;
use crate::models::{ComponentData, ProductData};

pub use bundle::BundleDataSource;
pub use cache::CacheDataSource;
pub use manager::DataSourceManager;
pub use registry::ClientContext;
pub use server::ServerDataSource;

/// Readiness of a data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// Not configured for this product; always skipped
    NotApplicable,
    /// Configured but holding no data yet
    Uninitialized,
    /// Able to answer reads
    Ready,
}

impl SourceStatus {
    /// Check if the source can answer reads
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotApplicable => write!(f, "not_applicable"),
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

/// Kind of data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Cache,
    Bundle,
    Server,
}

impl SourceType {
    /// Lowercase name for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Bundle => "bundle",
            Self::Server => "server",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider of one product's translation data
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Which kind of source this is
    fn source_type(&self) -> SourceType;

    /// Current readiness
    async fn status(&self) -> SourceStatus;

    /// Full product data; `Ok(None)` means "no data", not an error
    async fn get_product_translation(&self) -> Result<Option<ProductData>>;

    /// One component's messages for one locale
    async fn get_component_translation(
        &self,
        locale: &str,
        component: &str,
    ) -> Result<Option<ComponentData>>;

    /// Replace the source's data with `data`
    async fn set_product_translation(&self, data: &ProductData) -> Result<()>;

    /// Merge `delta` into the source's data
    async fn refresh_data(&self, delta: &ProductData) -> Result<()>;

    /// Locales the source holds data for
    async fn locale_list(&self) -> Result<BTreeSet<String>>;

    /// Components the source holds data for
    async fn component_list(&self) -> Result<BTreeSet<String>>;
}
