//! Concurrent access tests
//!
//! Readers must only ever observe a complete product snapshot, and concurrent
//! first requests for a product must share one warm-up.

use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use transync::config::ProductConfig;
use transync::datasource::{DataSource, DataSourceManager};
use transync::{ClientContext, ComponentData, ProductData};

use super::fixtures::{server_and_bundle, shared_factory, write_bundle, MockFetcher};

const KEYS: [&str; 4] = ["a", "b", "c", "d"];

/// Product where every message of every component carries `generation`
fn generation(generation: usize) -> ProductData {
    let mut data = ProductData::new("Acme", "1.0.0");
    for locale in ["en", "fr"] {
        for component in ["greeting", "errors"] {
            let messages: HashMap<String, String> = KEYS
                .iter()
                .map(|k| (k.to_string(), format!("v{generation}")))
                .collect();
            data.insert_component(locale, ComponentData::with_messages(component, messages));
        }
    }
    data
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_see_whole_snapshots() {
    let manager = Arc::new(
        DataSourceManager::new(Arc::new(ProductConfig::new("Acme", "1.0.0")), None)
            .await
            .unwrap(),
    );
    manager
        .cache()
        .set_product_translation(&generation(0))
        .await
        .unwrap();

    let writer = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            for g in 1..=50 {
                manager
                    .cache()
                    .set_product_translation(&generation(g))
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..8 {
        let manager = Arc::clone(&manager);
        readers.push(tokio::spawn(async move {
            for _ in 0..200 {
                let snapshot = manager
                    .get_product_translation()
                    .await
                    .expect("cache is populated");

                let mut seen: Vec<&str> = snapshot
                    .pairs()
                    .flat_map(|(_, component)| component.messages().values())
                    .map(String::as_str)
                    .collect();
                seen.dedup();
                assert_eq!(seen.len(), 1, "mixed generations in one snapshot: {seen:?}");
                assert_eq!(snapshot.pair_count(), 4);

                tokio::task::yield_now().await;
            }
        }));
    }

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }

    assert_eq!(
        manager.get_message("fr", "errors", "d").await.as_deref(),
        Some("v50")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_requests_share_warm_up() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = MockFetcher::new();
    fetcher.set("fr", "greeting", "hello", "Salut");

    let context = Arc::new(ClientContext::with_fetcher_factory(shared_factory(&fetcher)));
    context
        .register(server_and_bundle("Acme", temp_dir.path()))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let context = Arc::clone(&context);
        handles.push(tokio::spawn(async move { context.manager("Acme").await }));
    }

    let mut managers = Vec::new();
    for handle in handles {
        managers.push(handle.await.unwrap().unwrap());
    }

    assert!(managers.iter().all(|m| Arc::ptr_eq(m, &managers[0])));
    assert_eq!(fetcher.list_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_products_warm_up_independently() {
    let fetcher = MockFetcher::new();
    let context = Arc::new(ClientContext::with_fetcher_factory(shared_factory(&fetcher)));

    let mut dirs = Vec::new();
    for name in ["Acme", "Widgets", "Gadgets"] {
        let dir = TempDir::new().unwrap();
        write_bundle(dir.path(), "greeting", "en", &format!("hello=Hello {name}\n"));
        context
            .register(ProductConfig::new(name, "1.0.0").with_bundle_folder(dir.path()))
            .await
            .unwrap();
        dirs.push(dir);
    }

    let handles: Vec<_> = ["Acme", "Widgets", "Gadgets"]
        .into_iter()
        .map(|name| {
            let context = Arc::clone(&context);
            tokio::spawn(async move {
                let manager = context.manager(name).await.unwrap();
                manager.get_message("en", "greeting", "hello").await
            })
        })
        .collect();

    let mut greetings = Vec::new();
    for handle in handles {
        greetings.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(greetings, vec!["Hello Acme", "Hello Widgets", "Hello Gadgets"]);
    assert_eq!(context.active_products().await.len(), 3);
    // Bundle-only products never call the server
    assert_eq!(fetcher.list_calls(), 0);
}
