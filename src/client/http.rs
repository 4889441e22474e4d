//! reqwest-backed client for the translation service REST API

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::RemoteFetcher;
use crate::config::ProductConfig;
use crate::error::{Error, Result};
use crate::metrics;
use crate::utils::retry::{with_retry, RetryConfig};

/// How long calls are short-circuited after a request timed out
pub const SERVER_RETRY_INTERVAL: Duration = Duration::from_secs(2);

const API_ROOT: [&str; 4] = ["i18n", "api", "v2", "translation"];

/// Response envelope shared by every endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: ResponseStatus,
    data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseStatus {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct LocaleList {
    locales: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ComponentList {
    components: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ProductTranslation {
    #[serde(default)]
    bundles: Vec<TranslationBundle>,
}

#[derive(Debug, Deserialize)]
struct TranslationBundle {
    messages: Option<HashMap<String, String>>,
}

/// `2xx` and `6xx` business codes mean success
fn is_business_success(code: i64) -> bool {
    (200..300).contains(&code) || (600..700).contains(&code)
}

/// HTTP fetcher for one product version
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
    product: String,
    version: String,
    pseudo: bool,
    retry: RetryConfig,
    timed_out: AtomicBool,
    last_timeout_ms: AtomicI64,
}

impl HttpFetcher {
    /// Create a fetcher for a product configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no usable server URL is configured or a
    /// header is malformed, and `Error::Http` if the HTTP client cannot be
    /// created
    pub fn from_config(config: &ProductConfig) -> Result<Self> {
        let server = config
            .server_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                Error::config(format!(
                    "no server_url configured for product '{}'",
                    config.product_name
                ))
            })?;

        let base_url = Url::parse(server)
            .map_err(|e| Error::config(format!("invalid server_url '{server}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!("server_url '{server}' cannot be a base URL")));
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(config.header_map()?)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url,
            product: config.product_name.clone(),
            version: config.version.clone(),
            pseudo: config.pseudo,
            retry: config.retry.clone(),
            timed_out: AtomicBool::new(false),
            last_timeout_ms: AtomicI64::new(0),
        })
    }

    /// Build an endpoint URL below the product version root
    fn product_url(&self, tail: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(API_ROOT)
                .extend(["products", self.product.as_str(), "versions", self.version.as_str()]);
            if let Some(tail) = tail {
                segments.push(tail);
            }
        }
        url
    }

    fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Fail fast while the server is inside its timeout back-off window
    fn check_available(&self) -> Result<()> {
        if !self.timed_out.load(Ordering::Acquire) {
            return Ok(());
        }

        let since = Self::now_ms() - self.last_timeout_ms.load(Ordering::Acquire);
        if since < SERVER_RETRY_INTERVAL.as_millis() as i64 {
            return Err(Error::ServerUnavailable(format!(
                "{} timed out {since}ms ago",
                self.base_url
            )));
        }

        self.timed_out.store(false, Ordering::Release);
        Ok(())
    }

    fn mark_timeout(&self) {
        self.last_timeout_ms.store(Self::now_ms(), Ordering::Release);
        self.timed_out.store(true, Ordering::Release);
    }

    /// GET an endpoint and decode the `data` member of the envelope
    async fn get_data<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        self.check_available()?;

        debug!(url = %url, "Requesting translation service");
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                if e.is_timeout() {
                    warn!(url = %url, "Translation service timed out");
                    self.mark_timeout();
                }
                return Err(e.into());
            }
        };

        let status = response.status();
        let body = response.bytes().await.inspect_err(|e| {
            if e.is_timeout() {
                self.mark_timeout();
            }
        })?;

        if !status.is_success() {
            let envelope = serde_json::from_slice::<Envelope<serde_json::Value>>(&body).ok();
            let (code, message) = envelope
                .map(|env| (env.response.code, env.response.message))
                .unwrap_or_else(|| {
                    (
                        i64::from(status.as_u16()),
                        status.canonical_reason().unwrap_or_default().to_string(),
                    )
                });
            return Err(Error::Server {
                status: status.as_u16(),
                code,
                message,
            });
        }

        let envelope: Envelope<T> = serde_json::from_slice(&body)?;
        if !is_business_success(envelope.response.code) {
            return Err(Error::Server {
                status: status.as_u16(),
                code: envelope.response.code,
                message: envelope.response.message,
            });
        }

        envelope.data.ok_or_else(|| Error::Server {
            status: status.as_u16(),
            code: envelope.response.code,
            message: "response has no data".to_string(),
        })
    }

    /// [`Self::get_data`] with retries and metrics
    async fn get_with_retry<T: DeserializeOwned>(&self, endpoint: &str, url: Url) -> Result<T> {
        let result = with_retry(&self.retry, || self.get_data::<T>(&url)).await;
        metrics::record_remote_fetch(endpoint, result.is_ok());
        result
    }

    fn wrong_data(&self, what: &str) -> Error {
        Error::Server {
            status: 200,
            code: 200,
            message: format!(
                "wrong server data: missing {what} for {}/{}",
                self.product, self.version
            ),
        }
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch_locales_list(&self) -> Result<Vec<String>> {
        let url = self.product_url(Some("localelist"));
        let list: LocaleList = self.get_with_retry("localelist", url).await?;
        list.locales.ok_or_else(|| self.wrong_data("locales"))
    }

    async fn fetch_components_list(&self) -> Result<Vec<String>> {
        let url = self.product_url(Some("componentlist"));
        let list: ComponentList = self.get_with_retry("componentlist", url).await?;
        list.components.ok_or_else(|| self.wrong_data("components"))
    }

    async fn fetch_component_messages(
        &self,
        locale: &str,
        component: &str,
    ) -> Result<HashMap<String, String>> {
        let mut url = self.product_url(None);
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("locales", locale)
                .append_pair("components", component);
            if self.pseudo {
                query.append_pair("pseudo", "true");
            }
        }

        let data: ProductTranslation = self.get_with_retry("translation", url).await?;

        match <[TranslationBundle; 1]>::try_from(data.bundles) {
            Ok([TranslationBundle {
                messages: Some(messages),
            }]) => Ok(messages),
            _ => Err(self.wrong_data("messages")),
        }
    }
}
