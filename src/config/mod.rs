//! Configuration management for transync
//!
//! A [`ProductConfig`] describes where one product's translations come from
//! (remote server, local bundle folder) and how they are cached. Configurations
//! load from environment variables or TOML files and are validated before
//! registration.

pub mod registry;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::storage::BundleFormat;
pub use crate::utils::retry::RetryConfig;
pub use registry::ConfigRegistry;

/// Longest accepted resync period (ten years)
pub const MAX_CACHE_EXPIRY_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Where cached component maps are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// In-process map
    #[default]
    Memory,
    /// One JSON file per cache key under `cache_path`
    Disk,
}

impl std::str::FromStr for CacheMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "disk" => Ok(Self::Disk),
            other => Err(Error::config(format!("unknown cache mode: {other}"))),
        }
    }
}

/// Per-product configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProductConfig {
    /// Product name, unique within a registry
    pub product_name: String,

    /// Product version
    pub version: String,

    /// Base URL of the translation service
    pub server_url: Option<String>,

    /// Root of the local bundle folder
    pub bundle_folder: Option<PathBuf>,

    /// Cache backend
    pub cache_mode: CacheMode,

    /// Root directory for the disk cache backend
    pub cache_path: Option<PathBuf>,

    /// Enable the in-process cache
    pub enable_cache: bool,

    /// Warm the cache when the product is first accessed
    pub initialize_cache: bool,

    /// Periodically resync the cache from its sources
    pub clean_cache: bool,

    /// Resync period in seconds (0 disables expiry)
    pub cache_expiry_secs: u64,

    /// Request pseudo-translations
    pub pseudo: bool,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum concurrent message fetches during a full server fetch
    pub fetch_concurrency: usize,

    /// Format used when writing bundle files
    pub bundle_format: BundleFormat,

    /// Retry policy for remote calls
    pub retry: RetryConfig,

    /// Locales tried in order when a message is missing from the requested one
    pub fallback_locales: Vec<String>,

    /// Extra headers sent with every server request
    pub headers: BTreeMap<String, String>,
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            product_name: String::new(),
            version: String::new(),
            server_url: None,
            bundle_folder: None,
            cache_mode: CacheMode::Memory,
            cache_path: None,
            enable_cache: true,
            initialize_cache: true,
            clean_cache: false,
            cache_expiry_secs: 0,
            pseudo: false,
            request_timeout_secs: 10,
            fetch_concurrency: 1,
            bundle_format: BundleFormat::Properties,
            retry: RetryConfig::default(),
            fallback_locales: Vec::new(),
            headers: BTreeMap::new(),
        }
    }
}

impl ProductConfig {
    /// Create a configuration with defaults for everything but the identity
    pub fn new(product_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    /// Set the server URL
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Set the bundle folder
    #[must_use]
    pub fn with_bundle_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.bundle_folder = Some(folder.into());
        self
    }

    /// Use the disk cache backend rooted at `path`
    #[must_use]
    pub fn with_disk_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_mode = CacheMode::Disk;
        self.cache_path = Some(path.into());
        self
    }

    /// Enable periodic resync with the given period
    #[must_use]
    pub fn with_cache_expiry(mut self, secs: u64) -> Self {
        self.clean_cache = true;
        self.cache_expiry_secs = secs;
        self
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the locale fallback chain
    #[must_use]
    pub fn with_fallback_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_locales = locales.into_iter().map(Into::into).collect();
        self
    }

    /// Add a header sent with every server request
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Load configuration from `TRANSYNC_*` environment variables
    ///
    /// `TRANSYNC_PRODUCT` and `TRANSYNC_VERSION` are required; everything
    /// else falls back to its default when unset or unparsable.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let product_name = std::env::var("TRANSYNC_PRODUCT")
            .map_err(|_| Error::config("TRANSYNC_PRODUCT is not set"))?;
        let version = std::env::var("TRANSYNC_VERSION")
            .map_err(|_| Error::config("TRANSYNC_VERSION is not set"))?;

        let server_url = env_string("TRANSYNC_SERVER_URL");
        let bundle_folder = env_string("TRANSYNC_BUNDLE_FOLDER").map(PathBuf::from);
        let cache_path = env_string("TRANSYNC_CACHE_PATH").map(PathBuf::from);

        let cache_mode = env_parse("TRANSYNC_CACHE_MODE").unwrap_or(defaults.cache_mode);
        let bundle_format = env_parse("TRANSYNC_BUNDLE_FORMAT").unwrap_or(defaults.bundle_format);

        let retry = RetryConfig {
            max_retries: env_parse("TRANSYNC_MAX_RETRIES").unwrap_or(defaults.retry.max_retries),
            ..defaults.retry.clone()
        };

        Ok(Self {
            product_name,
            version,
            server_url,
            bundle_folder,
            cache_mode,
            cache_path,
            enable_cache: env_bool("TRANSYNC_ENABLE_CACHE").unwrap_or(defaults.enable_cache),
            initialize_cache: env_bool("TRANSYNC_INITIALIZE_CACHE")
                .unwrap_or(defaults.initialize_cache),
            clean_cache: env_bool("TRANSYNC_CLEAN_CACHE").unwrap_or(defaults.clean_cache),
            cache_expiry_secs: env_parse("TRANSYNC_CACHE_EXPIRY_SECS")
                .unwrap_or(defaults.cache_expiry_secs),
            pseudo: env_bool("TRANSYNC_PSEUDO").unwrap_or(defaults.pseudo),
            request_timeout_secs: env_parse("TRANSYNC_REQUEST_TIMEOUT")
                .unwrap_or(defaults.request_timeout_secs),
            fetch_concurrency: env_parse("TRANSYNC_FETCH_CONCURRENCY")
                .unwrap_or(defaults.fetch_concurrency),
            bundle_format,
            retry,
            fallback_locales: env_string("TRANSYNC_FALLBACK_LOCALES")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            headers: defaults.headers,
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.product_name.trim().is_empty() {
            return Err(Error::config("product_name must not be empty"));
        }

        if self.version.trim().is_empty() {
            return Err(Error::config(format!(
                "version must not be empty for product '{}'",
                self.product_name
            )));
        }

        if self.fetch_concurrency == 0 {
            return Err(Error::config("fetch_concurrency must be greater than 0"));
        }

        if self.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be greater than 0"));
        }

        if self.cache_expiry_secs > MAX_CACHE_EXPIRY_SECS {
            return Err(Error::config(format!(
                "cache_expiry_secs must be at most {MAX_CACHE_EXPIRY_SECS}, got {}",
                self.cache_expiry_secs
            )));
        }

        self.header_map()?;

        if self.cache_mode == CacheMode::Disk && self.cache_path.is_none() {
            return Err(Error::config(format!(
                "cache_path is required for disk cache mode (product '{}')",
                self.product_name
            )));
        }

        if let Some(server) = self.server_url.as_deref().filter(|s| !s.trim().is_empty()) {
            url::Url::parse(server)
                .map_err(|e| Error::config(format!("invalid server_url '{server}': {e}")))?;
        }

        Ok(())
    }

    /// Whether a non-empty server URL is configured
    pub fn has_server(&self) -> bool {
        self.server_url
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }

    /// Whether a non-empty bundle folder is configured
    pub fn has_bundle(&self) -> bool {
        self.bundle_folder
            .as_deref()
            .is_some_and(|p| !p.as_os_str().is_empty())
    }

    /// Whether the periodic synchronizer should run
    pub fn sync_enabled(&self) -> bool {
        self.has_server() && self.clean_cache && self.cache_expiry_secs > 0
    }

    /// Cache expiry as Duration
    #[must_use]
    pub fn cache_expiry(&self) -> Duration {
        Duration::from_secs(self.cache_expiry_secs)
    }

    /// Request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Extra request headers in the form the HTTP client takes
    pub fn header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::config(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("invalid value for header '{name}': {e}")))?;
            map.insert(header, value);
        }
        Ok(map)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl LoggingConfig {
    /// Load logging settings from `TRANSYNC_LOG_LEVEL` / `TRANSYNC_LOG_FORMAT`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: env_string("TRANSYNC_LOG_LEVEL").unwrap_or(defaults.level),
            format: env_string("TRANSYNC_LOG_FORMAT").unwrap_or(defaults.format),
        }
    }
}

/// Contents of a transync TOML configuration file
///
/// ```toml
/// [logging]
/// level = "debug"
///
/// [[products]]
/// product_name = "Acme"
/// version = "1.0.0"
/// bundle_folder = "bundles/acme"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ClientFileConfig {
    /// Single product table
    pub product: Option<ProductConfig>,

    /// Product array
    pub products: Vec<ProductConfig>,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl ClientFileConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let table: toml::Table = content.parse()?;
        if let Some(key) = find_unknown_key(&table) {
            return Err(Error::UnknownConfigKey {
                path: path.to_path_buf(),
                key,
            });
        }

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// All product configurations, `[product]` first
    pub fn all_products(&self) -> Vec<ProductConfig> {
        self.product
            .iter()
            .chain(self.products.iter())
            .cloned()
            .collect()
    }

    /// Validate every product configuration
    pub fn validate(&self) -> Result<()> {
        self.all_products().iter().try_for_each(ProductConfig::validate)
    }
}

// Keys accepted by each configuration table
const FILE_KEYS: &[&str] = &["product", "products", "logging"];
const LOGGING_KEYS: &[&str] = &["level", "format"];
const RETRY_KEYS: &[&str] = &["max_retries", "base_delay_ms", "max_delay_ms", "backoff_multiplier"];
const PRODUCT_KEYS: &[&str] = &[
    "product_name",
    "version",
    "server_url",
    "bundle_folder",
    "cache_mode",
    "cache_path",
    "enable_cache",
    "initialize_cache",
    "clean_cache",
    "cache_expiry_secs",
    "pseudo",
    "request_timeout_secs",
    "fetch_concurrency",
    "bundle_format",
    "retry",
    "fallback_locales",
    "headers",
];

/// Dotted path of the first key no configuration table accepts
///
/// Paths look like `products[1].retry.max_retry`.
fn find_unknown_key(root: &toml::Table) -> Option<String> {
    if let Some(key) = unknown_in(root, FILE_KEYS) {
        return Some(key);
    }

    if let Some(table) = root.get("logging").and_then(toml::Value::as_table) {
        if let Some(key) = unknown_in(table, LOGGING_KEYS) {
            return Some(format!("logging.{key}"));
        }
    }

    if let Some(table) = root.get("product").and_then(toml::Value::as_table) {
        if let Some(key) = unknown_in_product(table) {
            return Some(format!("product.{key}"));
        }
    }

    let products = root
        .get("products")
        .and_then(toml::Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    products.iter().enumerate().find_map(|(index, item)| {
        item.as_table()
            .and_then(unknown_in_product)
            .map(|key| format!("products[{index}].{key}"))
    })
}

fn unknown_in_product(table: &toml::Table) -> Option<String> {
    if let Some(key) = unknown_in(table, PRODUCT_KEYS) {
        return Some(key);
    }

    table
        .get("retry")
        .and_then(toml::Value::as_table)
        .and_then(|retry| unknown_in(retry, RETRY_KEYS))
        .map(|key| format!("retry.{key}"))
}

fn unknown_in(table: &toml::Table, known: &[&str]) -> Option<String> {
    table
        .keys()
        .find(|key| !known.contains(&key.as_str()))
        .cloned()
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.trim().parse::<T>().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    env_string(name).and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}
