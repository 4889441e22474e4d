//! Error scenario integration tests
//!
//! Tests failure modes of the HTTP-backed client:
//! 1. Server errors with a bundle to fall back on
//! 2. Request timeouts
//! 3. Partially failing component fetches
//! 4. Retrying a failed warm-up

use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use transync::config::{ProductConfig, RetryConfig};
use transync::error::Error;
use transync::ClientContext;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::write_bundle;

const ROOT: &str = "/i18n/api/v2/translation/products/Acme/versions/1.0.0";

fn config(server: &MockServer, bundle: &std::path::Path) -> ProductConfig {
    ProductConfig::new("Acme", "1.0.0")
        .with_server_url(server.uri())
        .with_bundle_folder(bundle)
        .with_retry(RetryConfig::disabled())
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "response": { "code": 200, "message": "OK" },
        "data": data
    }))
}

async fn mount_lists(server: &MockServer, locales: &[&str], components: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/localelist")))
        .respond_with(ok(json!({ "locales": locales })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/componentlist")))
        .respond_with(ok(json!({ "components": components })))
        .mount(server)
        .await;
}

fn bundle_response(locale: &str, component: &str, hello: &str) -> ResponseTemplate {
    ok(json!({
        "bundles": [{
            "component": component,
            "locale": locale,
            "messages": { "hello": hello }
        }]
    }))
}

// ============================================================================
// Server Error Tests
// ============================================================================

#[tokio::test]
async fn test_server_error_falls_back_to_bundle() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    write_bundle(temp_dir.path(), "greeting", "fr", "hello=Bonjour\n");

    let context = ClientContext::new();
    let manager = context
        .get_or_create(config(&mock_server, temp_dir.path()))
        .await
        .unwrap();

    assert_eq!(
        manager.get_message("fr", "greeting", "hello").await.as_deref(),
        Some("Bonjour")
    );
}

#[tokio::test]
async fn test_timeout_falls_back_to_bundle() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ok(json!({ "locales": ["fr"] })).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    write_bundle(temp_dir.path(), "greeting", "fr", "hello=Bonjour\n");

    let mut config = config(&mock_server, temp_dir.path());
    config.request_timeout_secs = 1;

    let manager = ClientContext::new().get_or_create(config).await.unwrap();

    assert_eq!(
        manager.get_message("fr", "greeting", "hello").await.as_deref(),
        Some("Bonjour")
    );
}

// ============================================================================
// Partial Failure Tests
// ============================================================================

#[tokio::test]
async fn test_failed_component_is_skipped() {
    let mock_server = MockServer::start().await;
    mount_lists(&mock_server, &["fr"], &["greeting", "errors"]).await;

    Mock::given(method("GET"))
        .and(path(ROOT))
        .and(query_param("components", "greeting"))
        .respond_with(bundle_response("fr", "greeting", "Salut"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(ROOT))
        .and(query_param("components", "errors"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let manager = ClientContext::new()
        .get_or_create(config(&mock_server, temp_dir.path()))
        .await
        .unwrap();

    assert_eq!(
        manager.get_message("fr", "greeting", "hello").await.as_deref(),
        Some("Salut")
    );
    assert!(manager.get_component_messages("fr", "errors").await.is_none());
    assert!(temp_dir.path().join("greeting/messages_fr.properties").exists());
    assert!(!temp_dir.path().join("errors").exists());
}

// ============================================================================
// Recovery Tests
// ============================================================================

#[tokio::test]
async fn test_warm_up_retried_after_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("bundle");

    let context = ClientContext::new();
    context
        .register(config(&mock_server, &missing))
        .await
        .unwrap();

    assert!(matches!(
        context.manager("Acme").await,
        Err(Error::InitializationFailed { .. })
    ));

    mount_lists(&mock_server, &["fr"], &["greeting"]).await;
    Mock::given(method("GET"))
        .and(path(ROOT))
        .respond_with(bundle_response("fr", "greeting", "Salut"))
        .mount(&mock_server)
        .await;

    let manager = context.manager("Acme").await.unwrap();
    assert_eq!(
        manager.get_message("fr", "greeting", "hello").await.as_deref(),
        Some("Salut")
    );
}
