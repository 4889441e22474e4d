//! Remote translation service client
//!
//! [`RemoteFetcher`] is the seam between the server data source and the wire.
//! [`HttpFetcher`] talks to the v2 REST API:
//!
//! - `GET {server}/i18n/api/v2/translation/products/{product}/versions/{version}/localelist`
//! - `GET {server}/i18n/api/v2/translation/products/{product}/versions/{version}/componentlist`
//! - `GET {server}/i18n/api/v2/translation/products/{product}/versions/{version}?locales={l}&components={c}`

pub mod http;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ProductConfig;
use crate::error::Result;

pub use http::{HttpFetcher, SERVER_RETRY_INTERVAL};

/// Fetches translation data of one product version from a remote service
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Locales the service has translations for
    async fn fetch_locales_list(&self) -> Result<Vec<String>>;

    /// Components of the product version
    async fn fetch_components_list(&self) -> Result<Vec<String>>;

    /// Message map of one (locale, component) pair
    async fn fetch_component_messages(
        &self,
        locale: &str,
        component: &str,
    ) -> Result<HashMap<String, String>>;
}

/// Builds the remote fetcher for a product configuration
pub type FetcherFactory =
    Arc<dyn Fn(&ProductConfig) -> Result<Arc<dyn RemoteFetcher>> + Send + Sync>;

/// Factory producing an [`HttpFetcher`] per product
pub fn http_fetcher_factory() -> FetcherFactory {
    Arc::new(|config: &ProductConfig| {
        let fetcher: Arc<dyn RemoteFetcher> = Arc::new(HttpFetcher::from_config(config)?);
        Ok(fetcher)
    })
}
