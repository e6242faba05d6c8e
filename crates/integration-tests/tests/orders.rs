//! Order creation, listing and booking through the services.

#![allow(clippy::unwrap_used)]

use axum::http::Method;
use rust_decimal::Decimal;
use serde_json::json;

use stagedoor_client::discovery::{EventSummary, PriceRange};
use stagedoor_client::services::{BookingService, OrderService};
use stagedoor_client::{Credential, GatewayError};
use stagedoor_core::types::order::parse_price;
use stagedoor_core::{Email, NewOrder, Price, Role, UserId, ValidationError};
use stagedoor_integration_tests::{MockBackend, MockResponse, api_client, fresh_session};

async fn signed_in(
    backend: &MockBackend,
    id: Option<UserId>,
) -> (OrderService, BookingService, stagedoor_client::SessionStore) {
    let (session, _) = fresh_session().await;
    session
        .login(
            Email::parse("fan@example.com").unwrap(),
            Credential::new("tok"),
            Role::User,
            id,
        )
        .await
        .unwrap();
    let api = api_client(&backend.base_url(), session.clone());
    (
        OrderService::new(api.clone(), session.clone()),
        BookingService::new(api, session.clone()),
        session,
    )
}

fn orders_body() -> serde_json::Value {
    json!({"orders": [
        {"id": 1, "title": "Wet Leg", "totalPrice": "30.00", "userId": 4},
        {"id": 2, "title": "IDLES", "price": 50, "userId": 5},
        {"id": 3, "title": "Comp ticket", "totalPrice": null}
    ]})
}

#[tokio::test]
async fn test_create_without_user_id_sends_nothing() {
    let backend = MockBackend::start(|_| MockResponse::ok(json!({}))).await;
    let (orders, _, _) = signed_in(&backend, None).await;

    let err = orders
        .create(NewOrder::new("Gig", parse_price("25").unwrap(), None))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Validation(ValidationError::MissingUserId)
    ));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_create_rejects_bad_price_locally() {
    let backend = MockBackend::start(|_| MockResponse::ok(json!({}))).await;
    let (orders, _, _) = signed_in(&backend, Some(UserId::new(4))).await;

    let err = orders
        .create(NewOrder::new("Gig", Price::ZERO, None))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Validation(ValidationError::InvalidPrice(_))
    ));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_create_fills_user_id_and_passes_body_through() {
    let backend = MockBackend::start(|req| {
        MockResponse::ok(json!({"message": "Order created", "order": req.body}))
    })
    .await;
    let (orders, _, _) = signed_in(&backend, Some(UserId::new(4))).await;

    let mut order = NewOrder::new("Gig", parse_price("25.5").unwrap(), None);
    order.venue = Some("Brudenell".to_string());
    let body = orders.create(order).await.unwrap();

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].path, "/order");
    assert_eq!(
        requests[0].body,
        json!({"title": "Gig", "totalPrice": 25.5, "venue": "Brudenell", "userId": 4})
    );
    assert_eq!(body["message"], "Order created");
}

#[tokio::test]
async fn test_list_uses_user_route_when_id_known() {
    let backend = MockBackend::start(|_| MockResponse::ok(orders_body())).await;
    let (orders, _, _) = signed_in(&backend, Some(UserId::new(4))).await;

    let listed = orders.list_for_session().await.unwrap();

    assert_eq!(listed.len(), 3);
    assert_eq!(backend.described(), vec!["GET /order/user/4"]);
}

#[tokio::test]
async fn test_list_falls_back_to_all_orders_without_id() {
    let backend = MockBackend::start(|_| MockResponse::ok(json!({"message": "no orders"}))).await;
    let (orders, _, _) = signed_in(&backend, None).await;

    let listed = orders.list_for_session().await.unwrap();

    assert!(listed.is_empty());
    assert_eq!(backend.described(), vec!["GET /order"]);
}

#[tokio::test]
async fn test_summary_tolerates_bad_prices() {
    let backend = MockBackend::start(|_| MockResponse::ok(orders_body())).await;
    let (orders, _, _) = signed_in(&backend, None).await;

    let summary = orders.summary().await.unwrap();

    assert_eq!(summary.count, 3);
    assert_eq!(summary.revenue, Price::new(Decimal::from(80)));
    assert_eq!(summary.revenue.display(), "$80.00");
    assert_eq!(summary.average.display(), "$26.67");
}

fn event() -> EventSummary {
    EventSummary {
        id: "G5vYZ9".to_string(),
        name: "Fontaines D.C.".to_string(),
        url: None,
        image: None,
        date: Some("2025-09-12".to_string()),
        time: None,
        venue: Some("Roundhouse".to_string()),
        city: Some("London".to_string()),
        price_range: PriceRange {
            min: Price::new(Decimal::from(42)),
            max: Price::new(Decimal::from(60)),
            estimated: false,
        },
        ticket_limit: None,
    }
}

#[tokio::test]
async fn test_book_event_creates_order() {
    let backend = MockBackend::start(|_| MockResponse::ok(json!({"message": "Order created"}))).await;
    let (_, booking, _) = signed_in(&backend, Some(UserId::new(9))).await;

    booking.book(&event()).await.unwrap();

    let requests = backend.requests();
    assert_eq!(requests[0].path, "/order");
    assert_eq!(
        requests[0].body,
        json!({
            "title": "Fontaines D.C.",
            "totalPrice": 42.0,
            "eventDate": "2025-09-12",
            "venue": "Roundhouse",
            "location": "London",
            "eventID": "G5vYZ9",
            "userId": 9
        })
    );
}

#[tokio::test]
async fn test_book_requires_user_id() {
    let backend = MockBackend::start(|_| MockResponse::ok(json!({}))).await;
    let (_, booking, session) = signed_in(&backend, None).await;
    assert!(session.current().await.unwrap().is_some());

    let err = booking.book(&event()).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Validation(ValidationError::MissingUserId)
    ));
    assert!(backend.requests().is_empty());
}
