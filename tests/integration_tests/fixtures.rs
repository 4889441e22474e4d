//! Test fixtures for integration tests
//!
//! Provides an in-memory remote fetcher and bundle helpers

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use transync::client::{FetcherFactory, RemoteFetcher};
use transync::config::ProductConfig;
use transync::error::{Error, Result};

type Messages = HashMap<String, String>;

/// Remote fetcher serving messages from memory
#[derive(Default)]
pub struct MockFetcher {
    data: Mutex<HashMap<(String, String), Messages>>,
    failing: AtomicBool,
    failing_pairs: Mutex<HashSet<(String, String)>>,
    list_calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Set one message, creating the (locale, component) pair if needed
    pub fn set(&self, locale: &str, component: &str, key: &str, value: &str) {
        let mut data = self.data.lock().unwrap();
        data.entry((locale.to_string(), component.to_string()))
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    /// Make every call fail with a 503
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make message fetches of one (locale, component) pair fail with a 503
    pub fn fail_component(&self, locale: &str, component: &str) {
        self.failing_pairs
            .lock()
            .unwrap()
            .insert((locale.to_string(), component.to_string()));
    }

    /// Number of locale list calls, one per full product fetch
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Server {
                status: 503,
                code: 503,
                message: "service unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteFetcher for MockFetcher {
    async fn fetch_locales_list(&self) -> Result<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let data = self.data.lock().unwrap();
        let locales: BTreeSet<String> = data.keys().map(|(l, _)| l.clone()).collect();
        Ok(locales.into_iter().collect())
    }

    async fn fetch_components_list(&self) -> Result<Vec<String>> {
        self.check()?;
        let data = self.data.lock().unwrap();
        let components: BTreeSet<String> = data.keys().map(|(_, c)| c.clone()).collect();
        Ok(components.into_iter().collect())
    }

    async fn fetch_component_messages(&self, locale: &str, component: &str) -> Result<Messages> {
        self.check()?;
        let pair = (locale.to_string(), component.to_string());
        if self.failing_pairs.lock().unwrap().contains(&pair) {
            return Err(Error::Server {
                status: 503,
                code: 503,
                message: format!("{component} in {locale} unavailable"),
            });
        }
        self.data
            .lock()
            .unwrap()
            .get(&(locale.to_string(), component.to_string()))
            .cloned()
            .ok_or_else(|| Error::Server {
                status: 404,
                code: 404,
                message: format!("no {component} in {locale}"),
            })
    }
}

/// Upcast a mock fetcher for APIs taking a trait object
pub fn as_remote(fetcher: &Arc<MockFetcher>) -> Arc<dyn RemoteFetcher> {
    let remote: Arc<dyn RemoteFetcher> = fetcher.clone();
    remote
}

/// Factory handing every product the same fetcher
pub fn shared_factory(fetcher: &Arc<MockFetcher>) -> FetcherFactory {
    let remote = as_remote(fetcher);
    Arc::new(move |_: &ProductConfig| -> Result<Arc<dyn RemoteFetcher>> {
        Ok(Arc::clone(&remote))
    })
}

/// Write a `.properties` bundle file
pub fn write_bundle(root: &Path, component: &str, locale: &str, content: &str) {
    let dir = root.join(component);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("messages_{locale}.properties")), content).unwrap();
}

/// Product configuration with a server and a bundle folder
pub fn server_and_bundle(product: &str, root: &Path) -> ProductConfig {
    ProductConfig::new(product, "1.0.0")
        .with_server_url("http://translations.invalid:8090")
        .with_bundle_folder(root)
}
