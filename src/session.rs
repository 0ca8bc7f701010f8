//! Authenticated-user state shared across the app.
//!
//! [`Session`] is a cheap cloneable handle. Pass it explicitly to whatever
//! needs the current identity; the booking orchestrator consumes a
//! [`BookingIdentity`] snapshot taken from it.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{BookingError, Result};
use crate::gateway::Gateway;
use crate::models::{Credentials, LoginResponse, Registration, User, UserId};
use crate::store::{keys, DraftStore};

/// Who a booking is made for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum BookingIdentity {
    /// No account; purchases are kept only on the device.
    #[default]
    Guest,
    /// A signed-in user.
    Authenticated(UserId),
}

impl BookingIdentity {
    /// Returns `true` for [`BookingIdentity::Guest`].
    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }

    /// The user id, if authenticated.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Guest => None,
            Self::Authenticated(id) => Some(id),
        }
    }
}

struct SessionInner {
    gateway: Arc<dyn Gateway>,
    store: Arc<dyn DraftStore>,
    user: Mutex<Option<User>>,
}

/// Handle to the process-wide sign-in state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Create a signed-out session.
    pub fn new(gateway: Arc<dyn Gateway>, store: Arc<dyn DraftStore>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                gateway,
                store,
                user: Mutex::new(None),
            }),
        }
    }

    /// Sign in and persist the user's identifiers.
    ///
    /// When `remember` is set the username is also saved for the sign-in
    /// screen. Persistence failures are logged and do not fail the sign-in.
    ///
    /// # Errors
    ///
    /// Returns a request-class error if the backend rejects the credentials.
    pub async fn login(&self, credentials: &Credentials, remember: bool) -> Result<User> {
        let response = self.inner.gateway.login(credentials).await?;
        if remember {
            self.persist(keys::SAVED_USERNAME, &credentials.username).await;
        }
        Ok(self.adopt(response).await)
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns a request-class error if the backend rejects the registration.
    pub async fn register(&self, registration: &Registration) -> Result<User> {
        let response = self.inner.gateway.register(registration).await?;
        Ok(self.adopt(response).await)
    }

    /// Rebuild the session from identifiers persisted by an earlier sign-in.
    ///
    /// Returns the restored user, or `None` if nothing usable was stored.
    pub async fn restore(&self) -> Option<User> {
        let user_id = self.read(keys::USER_ID).await?;
        let username = self.read(keys::USERNAME).await?;
        let token = self.read(keys::AUTH_TOKEN).await;
        if token.is_some() {
            self.inner.gateway.set_credential(token).await;
        }

        let user = User {
            id: user_id,
            username,
            email: None,
            role: None,
        };
        debug!(user_id = %user.id, "session restored from storage");
        *self.inner.user.lock().await = Some(user.clone());
        Some(user)
    }

    /// Re-fetch the signed-in user from the backend.
    ///
    /// A `401` means the stored credential is no longer valid; the session is
    /// signed out locally before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns a request-class error if the backend call fails.
    pub async fn refresh(&self) -> Result<User> {
        match self.inner.gateway.me().await {
            Ok(user) => {
                *self.inner.user.lock().await = Some(user.clone());
                Ok(user)
            }
            Err(err @ BookingError::Http { status: 401, .. }) => {
                info!("stored credential rejected, signing out locally");
                self.clear_local().await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Sign out. The local identity is cleared even if the backend call fails.
    pub async fn logout(&self) {
        if let Err(e) = self.inner.gateway.logout().await {
            warn!(error = %e, "backend logout failed");
        }
        self.clear_local().await;
        info!("signed out");
    }

    /// The identity to book under.
    pub async fn identity(&self) -> BookingIdentity {
        match self.inner.user.lock().await.as_ref() {
            Some(user) => BookingIdentity::Authenticated(user.id.clone()),
            None => BookingIdentity::Guest,
        }
    }

    /// The signed-in user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.inner.user.lock().await.clone()
    }

    /// Returns `true` if a user is signed in.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.user.lock().await.is_some()
    }

    // ── Internal helpers ────────────────────────────────────────────

    async fn adopt(&self, response: LoginResponse) -> User {
        let LoginResponse { user, token } = response;
        self.persist(keys::USER_ID, &user.id).await;
        self.persist(keys::USERNAME, &user.username).await;
        if let Some(token) = &token {
            self.persist(keys::AUTH_TOKEN, token).await;
        }
        info!(user_id = %user.id, "session started");
        *self.inner.user.lock().await = Some(user.clone());
        user
    }

    async fn clear_local(&self) {
        *self.inner.user.lock().await = None;
        for key in [keys::USER_ID, keys::USERNAME, keys::AUTH_TOKEN] {
            if let Err(e) = self.inner.store.remove(key).await {
                warn!(key, error = %e, "failed to clear session key");
            }
        }
    }

    async fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.inner.store.set(key, value.to_string()).await {
            warn!(key, error = %e, "failed to persist session key");
        }
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.inner.store.get(key).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(key, error = %e, "failed to read session key");
                None
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}
