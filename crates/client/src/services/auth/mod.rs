//! Authentication service.
//!
//! Ties the gateway's sign-in endpoints to the session store: validates input
//! locally, checks that the backend actually confirmed the sign-in, and
//! records the resulting identity.

mod error;

pub use error::AuthFlowError;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use stagedoor_core::Email;

use crate::api::{ApiClient, AuthKind, AuthMode};
use crate::error::add_breadcrumb;
use crate::session::{Credential, Identity, SessionStore};

/// Authentication service.
#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
    session: SessionStore,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    /// Sign in or sign up, then replace the session with the new identity.
    ///
    /// The credential is taken from the response when one is present;
    /// otherwise a local placeholder is synthesized, which keeps the session
    /// usable but is never sent back to the backend.
    ///
    /// # Errors
    ///
    /// Returns `AuthFlowError::InvalidEmail` or `AuthFlowError::EmptyPassword`
    /// before any request, `AuthFlowError::Gateway` when the request fails or
    /// the backend does not confirm success (`GatewayError::LoginFailed`), and
    /// `AuthFlowError::Session` if the identity cannot be stored.
    #[instrument(skip(self, email, password))]
    pub async fn sign_in(
        &self,
        kind: AuthKind,
        mode: AuthMode,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthFlowError> {
        let email = Email::parse(email)?;
        if password.expose_secret().is_empty() {
            return Err(AuthFlowError::EmptyPassword);
        }

        let response = self
            .api
            .authenticate(kind, mode, &email, password)
            .await?
            .ensure_successful()?;

        let user_id = response.user_id();
        let credential = match response.token {
            Some(token) => Credential::new(token),
            None => {
                warn!("Backend issued no credential, using a local placeholder");
                Credential::placeholder_for(&email)
            }
        };

        let identity = self
            .session
            .login(email, credential, kind.role(), user_id)
            .await?;

        add_breadcrumb("auth", "Signed in", Some(&[("role", identity.role.as_str())]));
        info!(email = %identity.email, has_id = identity.id.is_some(), "Sign-in complete");
        Ok(identity)
    }

    /// Sign out. Safe to call when already signed out.
    ///
    /// # Errors
    ///
    /// Returns `AuthFlowError::Session` if the stored identity cannot be cleared.
    pub async fn sign_out(&self) -> Result<(), AuthFlowError> {
        self.session.logout().await?;
        add_breadcrumb("auth", "Signed out", None);
        Ok(())
    }
}
