//! Sign-in and sign-up endpoints, and credential extraction from their responses.

use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use stagedoor_core::{Email, Role, UserId};

use super::{ApiClient, ApiRequest, GatewayError};

/// Which account namespace to authenticate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    User,
    Admin,
}

impl AuthKind {
    /// The role granted by a successful sign-in of this kind.
    #[must_use]
    pub const fn role(self) -> Role {
        match self {
            Self::User => Role::User,
            Self::Admin => Role::Admin,
        }
    }

    const fn segment(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// Sign in to an existing account, or create one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
}

impl AuthMode {
    const fn segment(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Signup => "signup",
        }
    }
}

/// A place a sign-in response may carry the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Top-level string field of the JSON body.
    BodyField(&'static str),
    /// Response header, with an optional scheme prefix to strip.
    Header {
        name: &'static str,
        strip_prefix: Option<&'static str>,
    },
}

/// Where to look for the credential, in priority order.
pub const CREDENTIAL_SOURCES: &[CredentialSource] = &[
    CredentialSource::BodyField("token"),
    CredentialSource::BodyField("accessToken"),
    CredentialSource::Header {
        name: "authorization",
        strip_prefix: Some("Bearer "),
    },
    CredentialSource::Header {
        name: "x-auth-token",
        strip_prefix: None,
    },
    CredentialSource::Header {
        name: "token",
        strip_prefix: None,
    },
];

impl CredentialSource {
    /// The non-empty credential at this location, if any.
    #[must_use]
    pub fn extract(&self, body: &Value, headers: &HeaderMap) -> Option<String> {
        let raw = match self {
            Self::BodyField(field) => body.get(*field).and_then(Value::as_str)?,
            Self::Header { name, strip_prefix } => {
                let value = headers.get(*name)?.to_str().ok()?.trim();
                match strip_prefix {
                    Some(prefix) => strip_prefix_ignore_case(value, prefix),
                    None => value,
                }
            }
        };

        let raw = raw.trim();
        (!raw.is_empty()).then(|| raw.to_string())
    }

    /// First credential found across `sources`.
    #[must_use]
    pub fn resolve(sources: &[Self], body: &Value, headers: &HeaderMap) -> Option<String> {
        sources.iter().find_map(|source| source.extract(body, headers))
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> &'a str {
    match value.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &value[prefix.len()..],
        _ => value,
    }
}

/// A sign-in or sign-up response with its credential resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthResponse {
    /// Response body as sent by the backend.
    pub body: Value,
    /// Credential found via [`CREDENTIAL_SOURCES`], if any.
    pub token: Option<String>,
}

impl AuthResponse {
    /// Resolve the credential from a raw response.
    #[must_use]
    pub fn from_parts(body: Value, headers: &HeaderMap) -> Self {
        let token = CredentialSource::resolve(CREDENTIAL_SOURCES, &body, headers);
        Self { body, token }
    }

    /// The backend's `message` field.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// Whether the backend reports success.
    ///
    /// True when `message` mentions "successful" (any case) or the body
    /// carries an `admin` or `user` object.
    #[must_use]
    pub fn is_successful(&self) -> bool {
        let says_so = self
            .message()
            .is_some_and(|m| m.to_ascii_lowercase().contains("successful"));
        let has_account = ["admin", "user"]
            .iter()
            .any(|key| self.body.get(key).is_some_and(Value::is_object));
        says_so || has_account
    }

    /// Fail with `LoginFailed` unless the response reports success.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::LoginFailed` carrying the backend message.
    pub fn ensure_successful(self) -> Result<Self, GatewayError> {
        if self.is_successful() {
            return Ok(self);
        }
        Err(GatewayError::LoginFailed {
            message: self
                .message()
                .or_else(|| self.body.get("error").and_then(Value::as_str))
                .unwrap_or("the server did not confirm the sign-in")
                .to_string(),
        })
    }

    /// The account id from `user.id`, `admin.id` or a top-level `id`.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        let candidates = [
            self.body.get("user").and_then(|u| u.get("id")),
            self.body.get("admin").and_then(|a| a.get("id")),
            self.body.get("id"),
        ];
        candidates.into_iter().flatten().find_map(|value| match value {
            Value::Number(n) => n.as_i64().map(UserId::new),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// The body with the resolved credential under a uniform `token` key.
    ///
    /// Non-object bodies are returned unchanged.
    #[must_use]
    pub fn into_json(self) -> Value {
        match (self.body, self.token) {
            (Value::Object(mut map), Some(token)) => {
                map.insert("token".to_string(), Value::String(token));
                Value::Object(map)
            }
            (body, _) => body,
        }
    }
}

impl ApiClient {
    /// `POST /admin/signup`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` or `GatewayError::Server`.
    pub async fn admin_signup(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, GatewayError> {
        self.authenticate(AuthKind::Admin, AuthMode::Signup, email, password)
            .await
    }

    /// `POST /admin/login`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` or `GatewayError::Server`.
    pub async fn admin_login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, GatewayError> {
        self.authenticate(AuthKind::Admin, AuthMode::Login, email, password)
            .await
    }

    /// `POST /user/signup`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` or `GatewayError::Server`.
    pub async fn user_signup(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, GatewayError> {
        self.authenticate(AuthKind::User, AuthMode::Signup, email, password)
            .await
    }

    /// `POST /user/login`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` or `GatewayError::Server`.
    pub async fn user_login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, GatewayError> {
        self.authenticate(AuthKind::User, AuthMode::Login, email, password)
            .await
    }

    /// `POST /{kind}/{mode}` with `{email, password}`.
    ///
    /// The HTTP status only decides between transport, server and 2xx; the
    /// success predicate is left to [`AuthResponse::ensure_successful`].
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` or `GatewayError::Server`.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn authenticate(
        &self,
        kind: AuthKind,
        mode: AuthMode,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, GatewayError> {
        let path = format!("{}/{}", kind.segment(), mode.segment());
        let body = json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        });

        let response = self.execute(ApiRequest::post(path, body)).await?;
        let auth = AuthResponse::from_parts(response.body, &response.headers);

        debug!(
            has_token = auth.token.is_some(),
            successful = auth.is_successful(),
            "Auth response received"
        );
        Ok(auth)
    }
}
