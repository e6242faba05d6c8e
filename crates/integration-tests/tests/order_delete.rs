//! Order deletion fallback probing against a live mock backend.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use stagedoor_client::GatewayError;
use stagedoor_client::api::{ApiClient, DeleteCandidate, IdPlacement};
use stagedoor_client::config::ApiConfig;
use stagedoor_core::OrderId;
use stagedoor_integration_tests::{
    MockBackend, MockResponse, api_client, fresh_session, unreachable_base_url,
};

#[tokio::test]
async fn test_delete_hits_first_route_once() {
    let backend = MockBackend::start(|req| {
        if req.method == Method::DELETE && req.path == "/order/7" {
            MockResponse::ok(json!({"message": "Order deleted"}))
        } else {
            MockResponse::not_found()
        }
    })
    .await;
    let (session, _) = fresh_session().await;
    let api = api_client(&backend.base_url(), session);

    let body = api.order_delete(OrderId::new(7)).await.unwrap();

    assert_eq!(body, json!({"message": "Order deleted"}));
    assert_eq!(backend.described(), vec!["DELETE /order/7"]);
}

#[tokio::test]
async fn test_delete_all_404_tries_four_routes_in_order() {
    let backend = MockBackend::start(|_| MockResponse::not_found()).await;
    let (session, _) = fresh_session().await;
    let api = api_client(&backend.base_url(), session);

    let err = api.order_delete(OrderId::new(7)).await.unwrap_err();

    let GatewayError::DeleteEndpointNotFound {
        order_id,
        attempted,
    } = err
    else {
        panic!("expected DeleteEndpointNotFound");
    };
    assert_eq!(order_id, OrderId::new(7));
    assert_eq!(attempted.len(), 4);

    assert_eq!(
        backend.described(),
        vec![
            "DELETE /order/7",
            "DELETE /order?id=7",
            "DELETE /orders/7",
            "POST /order/delete",
        ]
    );
    let requests = backend.requests();
    assert_eq!(requests[3].body, json!({"id": 7}));
}

#[tokio::test]
async fn test_delete_falls_through_to_post_route() {
    let backend = MockBackend::start(|req| {
        if req.method == Method::POST && req.path == "/order/delete" {
            MockResponse::ok(json!({"deleted": req.body["id"]}))
        } else {
            MockResponse::not_found()
        }
    })
    .await;
    let (session, _) = fresh_session().await;
    let api = api_client(&backend.base_url(), session);

    let body = api.order_delete(OrderId::new(31)).await.unwrap();

    assert_eq!(body, json!({"deleted": 31}));
    assert_eq!(backend.requests().len(), 4);
}

#[tokio::test]
async fn test_delete_stops_at_first_non_404_error() {
    let backend = MockBackend::start(|req| {
        if req.query.is_some() {
            MockResponse::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "database unavailable"}),
            )
        } else {
            MockResponse::not_found()
        }
    })
    .await;
    let (session, _) = fresh_session().await;
    let api = api_client(&backend.base_url(), session);

    let err = api.order_delete(OrderId::new(7)).await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(
        err.to_string(),
        "Server error (500 Internal Server Error): database unavailable"
    );
    assert_eq!(
        backend.described(),
        vec!["DELETE /order/7", "DELETE /order?id=7"]
    );
}

#[tokio::test]
async fn test_delete_transport_error_is_not_swallowed() {
    let (session, _) = fresh_session().await;
    let api = api_client(&unreachable_base_url().await, session);

    let err = api.order_delete(OrderId::new(7)).await.unwrap_err();

    assert!(err.is_retryable());
    assert!(matches!(err, GatewayError::Transport { .. }));
}

#[tokio::test]
async fn test_custom_candidate_list() {
    let backend = MockBackend::start(|req| {
        if req.path == "/tickets/remove" {
            MockResponse::ok(json!({"ok": true}))
        } else {
            MockResponse::not_found()
        }
    })
    .await;
    let (session, _) = fresh_session().await;
    let config = ApiConfig::new(&backend.base_url()).unwrap();
    let api = ApiClient::with_delete_candidates(
        &config,
        session,
        vec![
            DeleteCandidate::new(Method::DELETE, "tickets", IdPlacement::Path),
            DeleteCandidate::new(
                Method::PUT,
                "tickets/remove",
                IdPlacement::JsonBody("ticketId".to_string()),
            ),
        ],
    )
    .unwrap();

    api.order_delete(OrderId::new(5)).await.unwrap();

    let requests = backend.requests();
    assert_eq!(backend.described(), vec!["DELETE /tickets/5", "PUT /tickets/remove"]);
    assert_eq!(requests[1].body, json!({"ticketId": 5}));
}
