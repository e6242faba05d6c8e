//! Signed-in identity and its bearer credential.

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};

use stagedoor_core::{Email, Role, UserId};

/// Prefix marking a credential as synthesized locally rather than issued by
/// the backend. Such credentials are never sent upstream.
pub const PLACEHOLDER_PREFIX: &str = "session_";

/// Opaque bearer credential.
///
/// Either a token issued by the backend, or a placeholder synthesized when a
/// successful login came back without one.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Wrap a credential string as received or persisted.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Synthesize a placeholder for `email`, stamped with the current time.
    #[must_use]
    pub fn placeholder_for(email: &Email) -> Self {
        Self::new(format!(
            "{PLACEHOLDER_PREFIX}{}_{email}",
            Utc::now().timestamp_millis()
        ))
    }

    /// Whether this credential was synthesized locally.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.0.expose_secret().starts_with(PLACEHOLDER_PREFIX)
    }

    /// The value to send as a bearer token, or `None` for placeholders.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        if self.is_placeholder() {
            None
        } else {
            Some(self.0.expose_secret())
        }
    }

    /// The raw credential string.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_placeholder() {
            f.write_str("Credential(placeholder)")
        } else {
            f.write_str("Credential([REDACTED])")
        }
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Credential {}

/// The account currently signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: Email,
    pub role: Role,
    /// Backend user id, once the backend has returned one.
    pub id: Option<UserId>,
    pub credential: Credential,
}

impl Identity {
    /// Admin if the stored role says so, or if the email carries `admin_suffix`.
    ///
    /// The suffix match ignores ASCII case, since email domains are
    /// case-insensitive: `ops@ADMIN.COM` counts as an admin address.
    #[must_use]
    pub fn is_admin(&self, admin_suffix: &str) -> bool {
        self.role == Role::Admin || self.email.has_suffix(admin_suffix)
    }
}
