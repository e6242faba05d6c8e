//! Unified error handling with Sentry integration.
//!
//! [`AppError`] aggregates every module error for the command-line front end.
//! [`AppError::report`] captures unexpected failures to Sentry and returns the
//! message shown to the user.

use thiserror::Error;

use stagedoor_core::ValidationError;

use crate::api::GatewayError;
use crate::config::ConfigError;
use crate::discovery::DiscoveryError;
use crate::services::auth::AuthFlowError;
use crate::session::SessionError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Backend request failed.
    #[error("{0}")]
    Gateway(#[from] GatewayError),

    /// Event discovery failed.
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Sign-in or sign-up failed.
    #[error("{0}")]
    Auth(#[from] AuthFlowError),

    /// Input rejected before anything was sent.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Command requires a signed-in user.
    #[error("Not signed in")]
    NotSignedIn,

    /// Command requires an admin.
    #[error("Admin access required")]
    Forbidden,

    /// Requested item does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Whether this error points at a bug or an outage rather than user input.
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        match self {
            Self::Config(_) | Self::Session(_) | Self::Discovery(_) => true,
            Self::Gateway(err) => err.is_unexpected(),
            Self::Auth(AuthFlowError::Gateway(err)) => err.is_unexpected(),
            Self::Auth(AuthFlowError::Session(_)) => true,
            Self::Auth(_)
            | Self::Validation(_)
            | Self::NotSignedIn
            | Self::Forbidden
            | Self::NotFound(_) => false,
        }
    }

    /// Capture unexpected errors to Sentry and return the user-facing message.
    #[must_use]
    pub fn report(&self) -> String {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Command failed"
            );
        } else {
            tracing::debug!(error = %self, "Command rejected");
        }

        self.to_string()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Called after a successful sign-in to associate errors with the account.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on sign-out.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("orders", "Deleted order", Some(&[("order_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
