//! Stagedoor client library.
//!
//! Client core of the Stagedoor ticketing storefront: a persisted session
//! store, a gateway to the ticketing backend, and an event discovery client.
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`storage`] - Key-value persistence for the session
//! - [`session`] - Signed-in identity lifecycle
//! - [`api`] - Backend gateway (auth, orders, delete probing)
//! - [`discovery`] - Event listings from the discovery API
//! - [`services`] - Sign-in flow, orders and booking
//! - [`error`] - Aggregate error type and Sentry helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod discovery;
pub mod error;
pub mod services;
pub mod session;
pub mod storage;

pub use api::{ApiClient, GatewayError};
pub use config::ClientConfig;
pub use discovery::DiscoveryClient;
pub use error::AppError;
pub use session::{Credential, Identity, SessionError, SessionStore};
