//! crates/quizr_console_core/src/auth.rs
//!
//! The gate deciding whether a protected view may render.
//!
//! Deriving the status from a fetch outcome is a pure function; clearing the
//! credential happens here, but navigation back to the login entry point is
//! the caller's explicit action.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use crate::domain::AdminUser;
use crate::poll::{FetchOptions, ResourceKey, ResourcePool, Snapshot};
use crate::ports::{AdminApi, ApiError, CredentialStore};

/// Tri-state authentication status of the console session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// The identity check has not settled; render a neutral placeholder,
    /// never data-dependent content.
    Checking,
    /// The backend confirmed the identity; protected views may render.
    Authenticated(AdminUser),
    /// The session is not usable. `credential_rejected` is true when the
    /// backend refused the token (or attached no identity), in which case
    /// the stored credential must be cleared.
    Unauthenticated { credential_rejected: bool },
}

/// Derives the authentication status from an identity-check snapshot.
pub fn derive_auth_status(snapshot: &Snapshot<Option<AdminUser>>) -> AuthStatus {
    if let Some(err) = &snapshot.error {
        return AuthStatus::Unauthenticated {
            credential_rejected: matches!(err, ApiError::Auth),
        };
    }
    match &snapshot.value {
        None => AuthStatus::Checking,
        Some(None) => AuthStatus::Unauthenticated {
            credential_rejected: true,
        },
        Some(Some(user)) => AuthStatus::Authenticated(user.clone()),
    }
}

/// Runs the single-shot identity check for protected views.
///
/// The login view uses the same check inverted: an `Authenticated` result
/// there means "skip the login form and go straight in".
pub struct AuthGate {
    api: Arc<dyn AdminApi>,
    store: Arc<dyn CredentialStore>,
    identity_url: String,
    pool: ResourcePool<Option<AdminUser>>,
}

impl AuthGate {
    pub fn new(
        api: Arc<dyn AdminApi>,
        store: Arc<dyn CredentialStore>,
        identity_url: impl Into<String>,
    ) -> Self {
        Self {
            api,
            store,
            identity_url: identity_url.into(),
            pool: ResourcePool::new(),
        }
    }

    /// Checks the current identity once and returns the derived status.
    ///
    /// On a rejected credential the store is cleared; the caller decides how
    /// to route the operator afterwards.
    pub async fn check(&self) -> AuthStatus {
        let token = self
            .store
            .get()
            .map(|c| c.token)
            .unwrap_or_default();
        let key = ResourceKey::new(&self.identity_url, token);

        let api = self.api.clone();
        let mut sub = self.pool.subscribe(key, FetchOptions::once(), move || {
            let api = api.clone();
            Box::pin(async move { api.current_user().await })
        });

        let snapshot = sub.settled().await;
        let status = derive_auth_status(&snapshot);
        if let AuthStatus::Unauthenticated {
            credential_rejected: true,
        } = status
        {
            tracing::info!("identity check rejected the credential; clearing stored session");
            self.store.clear();
        }
        status
    }
}
