//! Command implementations.

pub mod auth;
pub mod events;
pub mod orders;

use std::sync::Arc;

use stagedoor_client::services::{AuthService, BookingService, OrderService};
use stagedoor_client::session::Identity;
use stagedoor_client::storage::FileStore;
use stagedoor_client::{AppError, ApiClient, ClientConfig, DiscoveryClient, SessionStore};

/// Everything a command needs, wired from configuration.
pub struct Context {
    pub session: SessionStore,
    pub api: ApiClient,
    pub discovery: DiscoveryClient,
}

impl Context {
    /// Open the session file, load the stored identity and build the clients.
    pub async fn open(config: &ClientConfig) -> Result<Self, AppError> {
        let storage = Arc::new(FileStore::new(&config.session_file));
        let session = SessionStore::new(storage, config.admin_email_suffix.clone());
        session.initialize().await?;

        let api = ApiClient::new(&config.api, session.clone())?;
        let discovery = DiscoveryClient::new(&config.discovery)?;

        Ok(Self {
            session,
            api,
            discovery,
        })
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone(), self.session.clone())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.api.clone(), self.session.clone())
    }

    pub fn booking(&self) -> BookingService {
        BookingService::new(self.api.clone(), self.session.clone())
    }

    /// The signed-in identity, or `AppError::NotSignedIn`.
    pub async fn require_identity(&self) -> Result<Identity, AppError> {
        self.session.current().await?.ok_or(AppError::NotSignedIn)
    }

    /// Fail with `AppError::Forbidden` unless an admin is signed in.
    pub async fn require_admin(&self) -> Result<Identity, AppError> {
        let identity = self.require_identity().await?;
        if self.session.is_admin().await? {
            Ok(identity)
        } else {
            Err(AppError::Forbidden)
        }
    }
}
