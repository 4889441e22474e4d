//! transync - Translation client with cache, bundle and server data sources
//!
//! Serves translated messages for one or more products out of an in-process
//! cache. The cache is filled from the first source that has data, tried in
//! order: the remote translation service, then the local bundle folder. A
//! background synchronizer refreshes the cache on a configurable period.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Per-product configuration and the configuration registry
//! - [`models`] - Product, locale and component translation data
//! - [`cache`] - Cache keys, expiry bookkeeping and message stores
//! - [`storage`] - Bundle files on disk (`.properties` and JSON)
//! - [`client`] - Remote translation service client
//! - [`datasource`] - Data sources, the per-product manager and its registry
//! - [`scheduler`] - Periodic cache synchronization
//! - [`metrics`] - Prometheus metrics
//! - [`utils`] - Retry helpers
//!
//! # Example
//!
//! ```no_run
//! use transync::config::ProductConfig;
//! use transync::datasource::ClientContext;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let context = ClientContext::new();
//!     let config = ProductConfig::new("Acme", "1.0.0")
//!         .with_server_url("http://localhost:8090")
//!         .with_bundle_folder("./translations");
//!
//!     let manager = context.get_or_create(config).await?;
//!     let hello = manager.get_message("fr", "greeting", "hello").await;
//!     println!("{hello:?}");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod datasource;
pub mod error;
pub mod metrics;
pub mod models;
pub mod scheduler;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::{CacheInfo, CacheKey, TranslationCache};
    pub use crate::config::{ClientFileConfig, ConfigRegistry, ProductConfig};
    pub use crate::datasource::{
        ClientContext, DataSource, DataSourceManager, SourceStatus, SourceType,
    };
    pub use crate::error::{Error, ErrorCategory, Result, TranslationErrorTrait};
    pub use crate::models::{ComponentData, LocaleData, ProductData};
}

// Direct re-exports for convenience
pub use datasource::{ClientContext, DataSourceManager};
pub use models::{ComponentData, LocaleData, ProductData};
