//! Backend API gateway.
//!
//! # Request pipeline
//!
//! Every call goes through [`ApiClient::execute`]:
//!
//! 1. Resolve the path against the configured base URL.
//! 2. Tag the request with a fresh `x-request-id`.
//! 3. Attach `Authorization: Bearer <token>` when the session holds a
//!    server-issued credential. Placeholder credentials are never sent.
//! 4. Map "no response" failures to [`GatewayError::Transport`] and non-2xx
//!    responses to [`GatewayError::Server`].
//!
//! Response bodies are passed through as JSON unless an operation normalizes
//! them.
//!
//! # Example
//!
//! ```rust,ignore
//! use stagedoor_client::api::ApiClient;
//!
//! let api = ApiClient::new(&config.api, session.clone())?;
//! let auth = api.user_login(&email, &password).await?;
//! let orders = api.order_get_by_user(user_id).await?;
//! ```

mod auth;
mod delete;
mod orders;

pub use auth::{AuthKind, AuthMode, AuthResponse, CREDENTIAL_SOURCES, CredentialSource};
pub use delete::{DeleteCandidate, IdPlacement};

use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{Span, debug, instrument, warn};
use url::Url;
use uuid::Uuid;

use stagedoor_core::{OrderId, ValidationError};

use crate::config::ApiConfig;
use crate::session::{SessionError, SessionStore};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest server body excerpt kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors raised by the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No response was received (connect failure, DNS, timeout).
    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-2xx status.
    #[error("Server error ({status}): {message}")]
    Server { status: StatusCode, message: String },

    /// Sign-in returned 2xx but the response does not report success.
    #[error("Login failed: {message}")]
    LoginFailed { message: String },

    /// Rejected locally; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Every delete endpoint candidate answered 404.
    #[error("No delete endpoint found for order {order_id} (tried: {})", .attempted.join(", "))]
    DeleteEndpointNotFound {
        order_id: OrderId,
        attempted: Vec<String>,
    },

    /// The session could not supply a credential.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Request payload could not be encoded.
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    /// Request path could not be resolved against the base URL.
    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Setup(#[source] reqwest::Error),
}

impl GatewayError {
    /// HTTP status of a server error.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a 404 from the backend.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Whether retrying the same request could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Whether this points at an outage or a bug rather than a rejected request.
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        match self {
            Self::Server { status, .. } => status.is_server_error(),
            Self::LoginFailed { .. } | Self::Validation(_) => false,
            Self::Transport { .. }
            | Self::DeleteEndpointNotFound { .. }
            | Self::Session(_)
            | Self::Encode(_)
            | Self::Url(_)
            | Self::Setup(_) => true,
        }
    }
}

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub(crate) fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).json(body)
    }

    pub(crate) fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub(crate) fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Human-readable form, e.g. `DELETE /order?id=7`.
    pub(crate) fn describe(&self) -> String {
        let mut out = format!("{} /{}", self.method, self.path.trim_start_matches('/'));
        for (i, (key, value)) in self.query.iter().enumerate() {
            out.push(if i == 0 { '?' } else { '&' });
            out.push_str(key);
            out.push('=');
            out.push_str(value);
        }
        if let Some(body) = &self.body {
            out.push(' ');
            out.push_str(&body.to_string());
        }
        out
    }
}

/// A successful (2xx) backend response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Decoded JSON body; `Null` when empty, a JSON string when not JSON.
    pub body: Value,
}

/// Client for the ticketing backend.
///
/// Cheap to clone; clones share the connection pool and session handle.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    session: SessionStore,
    delete_candidates: Vec<DeleteCandidate>,
    transport_message: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("delete_candidates", &self.inner.delete_candidates.len())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client using the default delete endpoint candidates.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Setup` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, session: SessionStore) -> Result<Self, GatewayError> {
        Self::with_delete_candidates(config, session, DeleteCandidate::defaults())
    }

    /// Create a client probing `candidates`, in order, when deleting orders.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Setup` if the HTTP client cannot be built.
    pub fn with_delete_candidates(
        config: &ApiConfig,
        session: SessionStore,
        candidates: Vec<DeleteCandidate>,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("stagedoor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GatewayError::Setup)?;

        let transport_message = format!(
            "Network Error: Unable to connect to the server. Please check if the backend is running on {}",
            config.base_url.as_str().trim_end_matches('/')
        );

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.clone(),
                session,
                delete_candidates: candidates,
                transport_message,
            }),
        })
    }

    /// The base URL every path is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The session this client reads credentials from.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Send one request through the pipeline.
    #[instrument(
        skip(self, request),
        fields(
            method = %request.method,
            path = %request.path,
            request_id = tracing::field::Empty,
        )
    )]
    pub(crate) async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, GatewayError> {
        let mut url = self
            .inner
            .base_url
            .join(request.path.trim_start_matches('/'))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }

        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());

        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), url)
            .header(REQUEST_ID_HEADER, &request_id);

        if let Some(credential) = self.inner.session.credential().await?
            && let Some(token) = credential.bearer()
        {
            builder = builder.bearer_auth(token);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        let body = decode_body(&bytes);

        debug!(status = status.as_u16(), "Backend responded");

        if !status.is_success() {
            return Err(GatewayError::Server {
                status,
                message: server_message(status, &body),
            });
        }

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    fn transport_error(&self, source: reqwest::Error) -> GatewayError {
        warn!(error = %source, timeout = source.is_timeout(), "Backend unreachable");
        GatewayError::Transport {
            message: self.inner.transport_message.clone(),
            source,
        }
    }
}

/// Decode a response body: empty → `Null`, JSON → parsed, anything else → string.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// The error message a server sent, or a truncated excerpt of its body.
fn server_message(status: StatusCode, body: &Value) -> String {
    let field = ["message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty());
    if let Some(message) = field {
        return message.to_string();
    }

    let text = match body {
        Value::Null => return status.canonical_reason().unwrap_or("Request failed").to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    text.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
