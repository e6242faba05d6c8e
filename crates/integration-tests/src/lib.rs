//! Integration tests for Stagedoor.
//!
//! The tests run the real client against [`MockBackend`], an in-process axum
//! server bound to `127.0.0.1:0` that records every request and answers
//! through a caller-supplied handler.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stagedoor-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use stagedoor_client::config::ApiConfig;
use stagedoor_client::storage::MemoryStore;
use stagedoor_client::{ApiClient, SessionStore};

/// Admin suffix used by every test session.
pub const ADMIN_SUFFIX: &str = "@admin.com";

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path without the `/api` prefix, e.g. `/order/7`.
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Value,
}

impl RecordedRequest {
    /// `METHOD /path?query`, e.g. `DELETE /order?id=7`.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.query {
            Some(query) => format!("{} {}?{query}", self.method, self.path),
            None => format!("{} {}", self.method, self.path),
        }
    }

    /// Value of a request header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A canned response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

impl MockResponse {
    #[must_use]
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self::json(StatusCode::OK, body)
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::json(
            StatusCode::NOT_FOUND,
            serde_json::json!({"message": "Route not found"}),
        )
    }

    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

impl IntoResponse for MockResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, axum::Json(self.body)).into_response();
        for (name, value) in self.headers {
            if let Ok(value) = HeaderValue::from_str(&value) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(name), value);
            }
        }
        response
    }
}

type Handler = dyn Fn(&RecordedRequest) -> MockResponse + Send + Sync;

#[derive(Clone)]
struct MockState {
    log: Arc<Mutex<Vec<RecordedRequest>>>,
    handler: Arc<Handler>,
}

/// In-process HTTP backend that records requests.
pub struct MockBackend {
    addr: SocketAddr,
    log: Arc<Mutex<Vec<RecordedRequest>>>,
    task: JoinHandle<()>,
}

impl MockBackend {
    /// Start a backend answering every request with `handler`.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
    {
        let log = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            log: Arc::clone(&log),
            handler: Arc::new(handler),
        };

        let app = Router::new().fallback(record).with_state(state);

        #[allow(clippy::unwrap_used)]
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        #[allow(clippy::unwrap_used)]
        let addr = listener.local_addr().unwrap();

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, log, task }
    }

    /// Base URL for the backend API, e.g. `http://127.0.0.1:41234/api`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Root URL of the server, without the `/api` prefix.
    #[must_use]
    pub fn root_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// [`RecordedRequest::describe`] for every request received so far.
    #[must_use]
    pub fn described(&self) -> Vec<String> {
        self.requests().iter().map(RecordedRequest::describe).collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn record(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> MockResponse {
    let path = uri.path();
    let request = RecordedRequest {
        method,
        path: path.strip_prefix("/api").unwrap_or(path).to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };

    let response = (state.handler)(&request);
    state
        .log
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(request);
    response
}

/// An initialized, signed-out session over fresh memory storage.
///
/// # Panics
///
/// Panics if the in-memory session cannot be initialized.
pub async fn fresh_session() -> (SessionStore, Arc<MemoryStore>) {
    let memory = Arc::new(MemoryStore::new());
    let session = SessionStore::new(memory.clone(), ADMIN_SUFFIX);
    #[allow(clippy::unwrap_used)]
    session.initialize().await.unwrap();
    (session, memory)
}

/// An API client for `base_url` with a short timeout.
///
/// # Panics
///
/// Panics if `base_url` is not a valid URL.
#[must_use]
pub fn api_client(base_url: &str, session: SessionStore) -> ApiClient {
    #[allow(clippy::unwrap_used)]
    let mut config = ApiConfig::new(base_url).unwrap();
    config.timeout = Duration::from_secs(5);
    #[allow(clippy::unwrap_used)]
    ApiClient::new(&config, session).unwrap()
}

/// A base URL nothing is listening on.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn unreachable_base_url() -> String {
    #[allow(clippy::unwrap_used)]
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    #[allow(clippy::unwrap_used)]
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}
