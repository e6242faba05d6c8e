//! Order deletion by ordered endpoint probing.
//!
//! Backends disagree on how an order is deleted, so the client tries a list
//! of candidate requests in order. A 404 means "not this route" and moves on
//! to the next candidate; any other outcome, success or failure, ends the
//! probe.

use std::future::Future;

use reqwest::Method;
use serde_json::{Map, Value};

use stagedoor_core::OrderId;

use super::ApiRequest;

/// Where a candidate puts the order id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdPlacement {
    /// Appended as the last path segment.
    Path,
    /// Sent as the named query parameter.
    Query(String),
    /// Sent as the named field of a JSON body.
    JsonBody(String),
}

/// One way of asking the backend to delete an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCandidate {
    pub method: Method,
    /// Path relative to the API base, without the id.
    pub path: String,
    pub id: IdPlacement,
}

impl DeleteCandidate {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, id: IdPlacement) -> Self {
        Self {
            method,
            path: path.into(),
            id,
        }
    }

    /// The four routes tried by default, in order:
    /// `DELETE /order/{id}`, `DELETE /order?id={id}`, `DELETE /orders/{id}`
    /// and `POST /order/delete {id}`.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(Method::DELETE, "order", IdPlacement::Path),
            Self::new(Method::DELETE, "order", IdPlacement::Query("id".to_string())),
            Self::new(Method::DELETE, "orders", IdPlacement::Path),
            Self::new(
                Method::POST,
                "order/delete",
                IdPlacement::JsonBody("id".to_string()),
            ),
        ]
    }

    pub(crate) fn request_for(&self, order_id: OrderId) -> ApiRequest {
        let path = self.path.trim_matches('/');
        match &self.id {
            IdPlacement::Path => ApiRequest::new(self.method.clone(), format!("{path}/{order_id}")),
            IdPlacement::Query(param) => {
                ApiRequest::new(self.method.clone(), path).query(param, order_id.to_string())
            }
            IdPlacement::JsonBody(field) => {
                let mut body = Map::new();
                body.insert(field.clone(), Value::from(order_id.as_i64()));
                ApiRequest::new(self.method.clone(), path).json(Value::Object(body))
            }
        }
    }
}

/// Run `attempt` over `requests` in order until one does not end in a
/// not-found error.
///
/// Returns `None` when every request was not-found (or there were none).
pub(crate) async fn probe_sequentially<R, T, E, F, Fut>(
    requests: impl IntoIterator<Item = R>,
    is_not_found: impl Fn(&E) -> bool,
    mut attempt: F,
) -> Option<Result<T, E>>
where
    F: FnMut(R) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    for request in requests {
        match attempt(request).await {
            Err(e) if is_not_found(&e) => {}
            outcome => return Some(outcome),
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_default_candidates_in_order() {
        let described: Vec<_> = DeleteCandidate::defaults()
            .iter()
            .map(|c| c.request_for(OrderId::new(42)).describe())
            .collect();

        assert_eq!(
            described,
            vec![
                "DELETE /order/42",
                "DELETE /order?id=42",
                "DELETE /orders/42",
                r#"POST /order/delete {"id":42}"#,
            ]
        );
    }

    #[tokio::test]
    async fn test_probe_stops_at_first_non_404() {
        let seen = RefCell::new(Vec::new());
        let outcome = probe_sequentially(
            [404_u16, 500, 200],
            |status: &u16| *status == 404,
            |status| {
                seen.borrow_mut().push(status);
                async move { if status == 200 { Ok(status) } else { Err(status) } }
            },
        )
        .await;

        assert_eq!(outcome, Some(Err(500)));
        assert_eq!(*seen.borrow(), vec![404, 500]);
    }

    #[tokio::test]
    async fn test_probe_returns_success() {
        let outcome = probe_sequentially(
            [404_u16, 200, 404],
            |status: &u16| *status == 404,
            |status| async move { if status == 200 { Ok("deleted") } else { Err(status) } },
        )
        .await;

        assert_eq!(outcome, Some(Ok("deleted")));
    }

    #[tokio::test]
    async fn test_probe_exhausted() {
        let mut calls = 0;
        let outcome: Option<Result<(), u16>> = probe_sequentially(
            [404_u16, 404, 404, 404],
            |status: &u16| *status == 404,
            |status| {
                calls += 1;
                async move { Err(status) }
            },
        )
        .await;

        assert_eq!(outcome, None);
        assert_eq!(calls, 4);
    }
}
