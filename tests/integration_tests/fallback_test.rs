//! Source fallback integration tests
//!
//! Covers warm-up through the server → bundle chain, mirroring of server data
//! into the bundle folder, resync and explicit backfill.

use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};
use transync::config::ProductConfig;
use transync::datasource::{DataSource, DataSourceManager, SourceStatus};
use transync::error::Error;
use transync::storage::properties;
use transync::ClientContext;

use super::fixtures::{as_remote, server_and_bundle, shared_factory, write_bundle, MockFetcher};

async fn manager(config: ProductConfig, fetcher: &Arc<MockFetcher>) -> DataSourceManager {
    DataSourceManager::new(Arc::new(config), Some(as_remote(fetcher)))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_bundle_used_when_server_fails() {
    let temp_dir = TempDir::new().unwrap();
    write_bundle(temp_dir.path(), "greeting", "fr", "hello=Bonjour\n");

    let fetcher = MockFetcher::new();
    fetcher.set_failing(true);

    let manager = manager(server_and_bundle("Acme", temp_dir.path()), &fetcher).await;
    assert_ok!(manager.init_cache().await);

    assert_eq!(
        manager.get_message("fr", "greeting", "hello").await.as_deref(),
        Some("Bonjour")
    );
    assert_eq!(manager.cache().status().await, SourceStatus::Ready);
}

#[tokio::test]
async fn test_server_data_mirrored_to_bundle() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = MockFetcher::new();
    fetcher.set("fr", "greeting", "hello", "Salut");

    let manager = manager(server_and_bundle("Acme", temp_dir.path()), &fetcher).await;
    manager.init_cache().await.unwrap();

    assert_eq!(
        manager.get_message("fr", "greeting", "hello").await.as_deref(),
        Some("Salut")
    );

    let written = temp_dir.path().join("greeting/messages_fr.properties");
    let content = std::fs::read_to_string(&written).expect("bundle file should be written");
    let messages = properties::parse(&content).unwrap();
    assert_eq!(messages.get("hello").map(String::as_str), Some("Salut"));
}

#[tokio::test]
async fn test_server_takes_precedence_over_bundle() {
    let temp_dir = TempDir::new().unwrap();
    write_bundle(temp_dir.path(), "greeting", "fr", "hello=Bonjour\n");

    let fetcher = MockFetcher::new();
    fetcher.set("fr", "greeting", "hello", "Salut");

    let manager = manager(server_and_bundle("Acme", temp_dir.path()), &fetcher).await;
    manager.init_cache().await.unwrap();

    assert_eq!(
        manager.get_message("fr", "greeting", "hello").await.as_deref(),
        Some("Salut")
    );
}

#[tokio::test]
async fn test_no_source_has_data() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing");
    let fetcher = MockFetcher::new();

    let manager = manager(server_and_bundle("Acme", &missing), &fetcher).await;
    let err = assert_err!(manager.init_cache().await);

    assert!(matches!(err, Error::InitializationFailed { .. }));
    assert_eq!(manager.cache().status().await, SourceStatus::Uninitialized);
    assert!(manager.get_product_translation().await.is_none());
    assert!(manager.get_message("fr", "greeting", "hello").await.is_none());
}

#[tokio::test]
async fn test_sync_replaces_cached_data() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = MockFetcher::new();
    fetcher.set("fr", "greeting", "hello", "Salut");

    let manager = manager(server_and_bundle("Acme", temp_dir.path()), &fetcher).await;
    manager.init_cache().await.unwrap();

    fetcher.set("fr", "greeting", "hello", "Coucou");
    fetcher.set("de", "greeting", "hello", "Hallo");
    assert!(manager.sync_cache().await);

    assert_eq!(
        manager.get_message("fr", "greeting", "hello").await.as_deref(),
        Some("Coucou")
    );
    assert!(manager.locale_list().await.contains("de"));
}

#[tokio::test]
async fn test_partial_sync_keeps_unfetched_pairs() {
    let fetcher = MockFetcher::new();
    fetcher.set("fr", "greeting", "hello", "Salut");
    fetcher.set("fr", "menu", "file", "Fichier");

    let config =
        ProductConfig::new("Acme", "1.0.0").with_server_url("http://translations.invalid:8090");
    let manager = manager(config, &fetcher).await;
    manager.init_cache().await.unwrap();

    fetcher.set("fr", "greeting", "hello", "Coucou");
    fetcher.fail_component("fr", "menu");
    assert!(manager.sync_cache().await);

    assert_eq!(
        manager.get_message("fr", "greeting", "hello").await.as_deref(),
        Some("Coucou")
    );
    assert_eq!(
        manager.get_message("fr", "menu", "file").await.as_deref(),
        Some("Fichier")
    );
    assert!(manager.component_list().await.contains("menu"));
    assert!(manager.cached_entry("fr", "menu").await.is_some());
}

#[tokio::test]
async fn test_failed_sync_falls_back_to_mirrored_bundle() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = MockFetcher::new();
    fetcher.set("fr", "greeting", "hello", "Salut");

    let manager = manager(server_and_bundle("Acme", temp_dir.path()), &fetcher).await;
    manager.init_cache().await.unwrap();

    // The bundle now holds the server's data, so a server outage is survivable
    fetcher.set_failing(true);
    assert!(manager.sync_cache().await);
    assert_eq!(
        manager.get_message("fr", "greeting", "hello").await.as_deref(),
        Some("Salut")
    );
}

#[tokio::test]
async fn test_failed_sync_keeps_current_data() {
    let fetcher = MockFetcher::new();
    fetcher.set("fr", "greeting", "hello", "Salut");

    let config =
        ProductConfig::new("Acme", "1.0.0").with_server_url("http://translations.invalid:8090");
    let manager = manager(config, &fetcher).await;
    manager.init_cache().await.unwrap();

    fetcher.set_failing(true);
    assert!(!manager.sync_cache().await);
    assert_eq!(
        manager.get_message("fr", "greeting", "hello").await.as_deref(),
        Some("Salut")
    );
}

#[tokio::test]
async fn test_backfill_component_from_server() {
    let temp_dir = TempDir::new().unwrap();
    write_bundle(temp_dir.path(), "greeting", "fr", "hello=Bonjour\n");

    let fetcher = MockFetcher::new();
    fetcher.set_failing(true);

    let manager = manager(server_and_bundle("Acme", temp_dir.path()), &fetcher).await;
    manager.init_cache().await.unwrap();
    assert!(manager.get_component_messages("fr", "errors").await.is_none());

    fetcher.set_failing(false);
    fetcher.set("fr", "errors", "not_found", "Introuvable");

    let found = manager.backfill_component("fr", "errors").await.unwrap();
    assert_eq!(found.unwrap().get("not_found"), Some("Introuvable"));

    // Cache gains the component without losing the warm-up data
    assert_eq!(
        manager.get_message("fr", "errors", "not_found").await.as_deref(),
        Some("Introuvable")
    );
    assert_eq!(
        manager.get_message("fr", "greeting", "hello").await.as_deref(),
        Some("Bonjour")
    );
    assert!(temp_dir.path().join("errors/messages_fr.properties").exists());
}

#[tokio::test]
async fn test_distinct_managers_per_product() {
    let acme_dir = TempDir::new().unwrap();
    let widgets_dir = TempDir::new().unwrap();
    write_bundle(acme_dir.path(), "greeting", "en", "hello=Hello from Acme\n");
    write_bundle(widgets_dir.path(), "greeting", "en", "hello=Hello from Widgets\n");

    let fetcher = MockFetcher::new();
    fetcher.set_failing(true);
    let context = ClientContext::with_fetcher_factory(shared_factory(&fetcher));

    let acme = context
        .get_or_create(server_and_bundle("Acme", acme_dir.path()))
        .await
        .unwrap();
    let widgets = context
        .get_or_create(server_and_bundle("Widgets", widgets_dir.path()))
        .await
        .unwrap();

    assert!(!Arc::ptr_eq(&acme, &widgets));
    assert!(Arc::ptr_eq(&acme, &context.manager("Acme").await.unwrap()));
    assert_eq!(
        acme.get_message("en", "greeting", "hello").await.as_deref(),
        Some("Hello from Acme")
    );
    assert_eq!(
        widgets.get_message("en", "greeting", "hello").await.as_deref(),
        Some("Hello from Widgets")
    );
    assert_eq!(context.active_products().await, vec!["Acme", "Widgets"]);
}
