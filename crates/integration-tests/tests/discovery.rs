//! Event discovery against a mock upstream.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;
use url::Url;

use stagedoor_client::DiscoveryClient;
use stagedoor_client::config::DiscoveryConfig;
use stagedoor_client::discovery::DiscoveryError;
use stagedoor_core::Price;
use stagedoor_integration_tests::{MockBackend, MockResponse};

fn client_for(backend: &MockBackend) -> DiscoveryClient {
    let config = DiscoveryConfig {
        endpoint: Url::parse(&format!("{}/discovery/v2/events", backend.root_url())).unwrap(),
        api_key: Some(SecretString::from("k3y")),
        page_size: 20,
        timeout: Duration::from_secs(5),
    };
    DiscoveryClient::new(&config).unwrap()
}

fn page() -> serde_json::Value {
    json!({
        "_embedded": {"events": [
            {
                "id": "vv1A",
                "name": "Big Thief",
                "images": [{"ratio": "16_9", "width": 205, "height": 115, "url": "thumb.jpg"}],
                "dates": {"start": {"localDate": "2025-07-04"}},
                "_embedded": {"venues": [{"name": "Albert Hall", "city": {"name": "Manchester"}}]},
                "priceRanges": [{"min": 28, "max": 45}]
            },
            {"id": "vv1B", "name": "No Price Band"}
        ]},
        "page": {"size": 20, "number": 1}
    })
}

#[tokio::test]
async fn test_lists_events_with_expected_query() {
    let backend = MockBackend::start(|_| MockResponse::ok(page())).await;
    let client = client_for(&backend);

    let events = client.events(1).await.unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].venue.as_deref(), Some("Albert Hall"));
    assert_eq!(events[0].price_range.min, Price::new(Decimal::from(28)));
    assert!(events[1].price_range.estimated);

    let requests = backend.requests();
    assert_eq!(requests[0].path, "/discovery/v2/events");
    assert_eq!(
        requests[0].query.as_deref(),
        Some("apikey=k3y&locale=*&size=20&page=1")
    );
}

#[tokio::test]
async fn test_pages_are_cached() {
    let backend = MockBackend::start(|_| MockResponse::ok(page())).await;
    let client = client_for(&backend);

    let first = client.events(0).await.unwrap();
    let second = client.events(0).await.unwrap();

    // estimated prices stay stable while cached
    assert_eq!(first, second);
    assert_eq!(backend.requests().len(), 1);

    client.events(1).await.unwrap();
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn test_invalidate_all_forces_refetch() {
    let backend = MockBackend::start(|_| MockResponse::ok(page())).await;
    let client = client_for(&backend);

    client.events(0).await.unwrap();
    client.invalidate_all().await;
    client.events(0).await.unwrap();

    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn test_find_event_on_page() {
    let backend = MockBackend::start(|_| MockResponse::ok(page())).await;
    let client = client_for(&backend);

    assert_eq!(
        client.find(0, "vv1B").await.unwrap().map(|e| e.name),
        Some("No Price Band".to_string())
    );
    assert_eq!(client.find(0, "missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_missing_embedded_is_empty_page() {
    let backend = MockBackend::start(|_| MockResponse::ok(json!({"page": {"totalElements": 0}}))).await;
    let client = client_for(&backend);

    assert!(client.events(9).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upstream_error() {
    let backend = MockBackend::start(|_| {
        MockResponse::json(StatusCode::UNAUTHORIZED, json!({"fault": "Invalid ApiKey"}))
    })
    .await;
    let client = client_for(&backend);

    let err = client.events(0).await.unwrap_err();
    assert!(matches!(
        err,
        DiscoveryError::Upstream { status, .. } if status == StatusCode::UNAUTHORIZED
    ));
}
