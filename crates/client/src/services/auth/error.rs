//! Sign-in flow error types.

use thiserror::Error;

use crate::api::GatewayError;
use crate::session::SessionError;

/// Errors that can occur while signing in, signing up or signing out.
#[derive(Debug, Error)]
pub enum AuthFlowError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] stagedoor_core::EmailError),

    /// Password was empty.
    #[error("password cannot be empty")]
    EmptyPassword,

    /// Backend call failed or did not confirm the sign-in.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Identity could not be stored.
    #[error(transparent)]
    Session(#[from] SessionError),
}
