//! Session store: who is signed in, and how that survives a restart.
//!
//! [`SessionStore`] is an explicitly constructed, cheaply cloneable handle.
//! It starts out *pending*; [`SessionStore::initialize`] loads the persisted
//! identity exactly once and flips it to *ready*. Every other operation fails
//! with [`SessionError::NotInitialized`] until then, so "not yet known" can
//! never be mistaken for "signed out".
//!
//! # Consistency
//!
//! `login` and `logout` hold the write lock while committing one storage
//! batch and swapping the in-memory identity. Readers take the read lock, so
//! they observe either the old identity or the new one, never a mix.

mod identity;

pub use identity::{Credential, Identity, PLACEHOLDER_PREFIX};

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use stagedoor_core::{Email, Role, UserId};

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::storage::{KeyValueStore, StorageError, WriteBatch};

/// Storage keys for the persisted identity.
pub mod keys {
    /// Bearer credential (server-issued or placeholder).
    pub const TOKEN: &str = "token";

    /// Email of the signed-in account.
    pub const USER_EMAIL: &str = "userEmail";

    /// Role, `user` or `admin`.
    pub const USER_TYPE: &str = "userType";

    /// Backend user id, decimal string.
    pub const USER_ID: &str = "userId";

    /// Every key owned by the session.
    pub const ALL: [&str; 4] = [TOKEN, USER_EMAIL, USER_TYPE, USER_ID];
}

/// Errors raised by the session store.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The store was used before `initialize()` completed.
    #[error("session store used before initialize()")]
    NotInitialized,

    /// Persistent storage could not be read or written.
    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),
}

enum SessionState {
    Pending,
    Ready(Option<Identity>),
}

/// Handle to the process-wide session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    storage: Arc<dyn KeyValueStore>,
    admin_suffix: String,
    state: RwLock<SessionState>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("admin_suffix", &self.inner.admin_suffix)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a pending store over `storage`.
    ///
    /// Nothing is read until [`initialize`](Self::initialize) is called.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, admin_suffix: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                storage,
                admin_suffix: admin_suffix.into(),
                state: RwLock::new(SessionState::Pending),
            }),
        }
    }

    /// Load the persisted identity, once.
    ///
    /// An identity is restored only when both a token and an email are
    /// stored. A missing or unknown role falls back to `user`; an unparseable
    /// id is dropped. Calls after the first are no-ops and return the
    /// identity already in memory.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the backing store cannot be read.
    /// The store stays pending in that case.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<Option<Identity>, SessionError> {
        let mut state = self.inner.state.write().await;

        if let SessionState::Ready(identity) = &*state {
            debug!("Session already initialized");
            return Ok(identity.clone());
        }

        let identity = self.load_persisted()?;
        match &identity {
            Some(identity) => info!(email = %identity.email, role = %identity.role, "Session restored"),
            None => debug!("No persisted session"),
        }

        *state = SessionState::Ready(identity.clone());
        Ok(identity)
    }

    /// Whether [`initialize`](Self::initialize) has completed.
    pub async fn is_ready(&self) -> bool {
        matches!(*self.inner.state.read().await, SessionState::Ready(_))
    }

    /// The signed-in identity, or `None` when signed out.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInitialized` before `initialize()`.
    pub async fn current(&self) -> Result<Option<Identity>, SessionError> {
        match &*self.inner.state.read().await {
            SessionState::Ready(identity) => Ok(identity.clone()),
            SessionState::Pending => Err(SessionError::NotInitialized),
        }
    }

    /// The current credential, if signed in.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInitialized` before `initialize()`.
    pub async fn credential(&self) -> Result<Option<Credential>, SessionError> {
        Ok(self.current().await?.map(|identity| identity.credential))
    }

    /// Replace the session with a new identity and persist it.
    ///
    /// `id` is stored only when present and non-zero; otherwise any stale
    /// `userId` from an earlier session is removed. The credential is trusted
    /// as-is.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInitialized` before `initialize()`, or
    /// `SessionError::Storage` if persisting fails (in which case the
    /// in-memory identity is left unchanged).
    #[instrument(skip(self, credential), fields(email = %email, role = %role))]
    pub async fn login(
        &self,
        email: Email,
        credential: Credential,
        role: Role,
        id: Option<UserId>,
    ) -> Result<Identity, SessionError> {
        let mut state = self.inner.state.write().await;
        if matches!(*state, SessionState::Pending) {
            return Err(SessionError::NotInitialized);
        }

        let id = id.filter(|id| id.as_i64() != 0);

        let mut batch = WriteBatch::new()
            .set(keys::TOKEN, credential.expose())
            .set(keys::USER_EMAIL, email.as_str())
            .set(keys::USER_TYPE, role.as_str());
        batch = match id {
            Some(id) => batch.set(keys::USER_ID, id.to_string()),
            None => batch.remove(keys::USER_ID),
        };
        self.inner.storage.commit(batch)?;

        let identity = Identity {
            email,
            role,
            id,
            credential,
        };
        *state = SessionState::Ready(Some(identity.clone()));

        set_sentry_user(
            &identity
                .id
                .map_or_else(|| identity.email.to_string(), |id| id.to_string()),
            Some(identity.email.as_str()),
        );
        info!(
            placeholder = identity.credential.is_placeholder(),
            "Signed in"
        );

        Ok(identity)
    }

    /// Sign out, clearing every persisted session key.
    ///
    /// Safe to call when already signed out.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInitialized` before `initialize()`, or
    /// `SessionError::Storage` if the keys cannot be removed.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), SessionError> {
        let mut state = self.inner.state.write().await;
        let was_signed_in = match &*state {
            SessionState::Pending => return Err(SessionError::NotInitialized),
            SessionState::Ready(identity) => identity.is_some(),
        };

        let batch = keys::ALL
            .iter()
            .fold(WriteBatch::new(), |batch, key| batch.remove(key));
        self.inner.storage.commit(batch)?;

        *state = SessionState::Ready(None);
        clear_sentry_user();

        if was_signed_in {
            info!("Signed out");
        } else {
            debug!("Logout with no active session");
        }
        Ok(())
    }

    /// Whether the signed-in account is an admin.
    ///
    /// True when the stored role is admin or the email ends with the admin
    /// suffix; false when signed out.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInitialized` before `initialize()`.
    pub async fn is_admin(&self) -> Result<bool, SessionError> {
        Ok(self
            .current()
            .await?
            .is_some_and(|identity| identity.is_admin(&self.inner.admin_suffix)))
    }

    fn load_persisted(&self) -> Result<Option<Identity>, SessionError> {
        let mut stored = self.inner.storage.get_many(&keys::ALL)?;
        stored.retain(|_, value| !value.is_empty());

        let token = stored.remove(keys::TOKEN);
        let email = stored.remove(keys::USER_EMAIL);
        let (Some(token), Some(email)) = (token, email) else {
            return Ok(None);
        };

        let email = match Email::parse(&email) {
            Ok(email) => email,
            Err(e) => {
                warn!(error = %e, "Persisted session email is invalid, treating as signed out");
                return Ok(None);
            }
        };

        let role = match stored.remove(keys::USER_TYPE) {
            None => Role::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(role = %raw, "Unknown persisted role, defaulting to user");
                Role::default()
            }),
        };

        let id = stored
            .remove(keys::USER_ID)
            .and_then(|raw| raw.parse::<UserId>().ok())
            .filter(|id| id.as_i64() != 0);

        Ok(Some(Identity {
            email,
            role,
            id,
            credential: Credential::new(token),
        }))
    }
}
