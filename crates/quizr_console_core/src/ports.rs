//! crates/quizr_console_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the console's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like the admin
//! backend or the text-generation provider.

use async_trait::async_trait;
use chrono::Duration;

use crate::domain::{AdminUser, Credential, NewUser, QuizRecord, UserRecord};

//=========================================================================================
// Transport Error Taxonomy
//=========================================================================================

/// The outcome taxonomy for every remote call the console makes.
///
/// `Auth` is never surfaced inline; it propagates to the auth gate, which
/// clears the stored credential. `Server` and `Network` are per-call outcomes
/// shown to the operator (or folded into a polling snapshot).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Credential missing, invalid, or expired (401/403 from the backend).
    #[error("unauthorized: credential missing, invalid, or expired")]
    Auth,

    /// The backend was reachable but rejected the request. Carries the
    /// backend-supplied message when one was present.
    #[error("server rejected the request ({status}): {message}")]
    Server { status: u16, message: String },

    /// The call could not complete at all (connect failure or timeout).
    #[error("network failure: {0}")]
    Network(String),
}

/// A convenience type alias for `Result<T, ApiError>`.
pub type ApiResult<T> = Result<T, ApiError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The admin backend consumed by the console.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Exchanges credentials for a bearer token (`POST /admin/login`).
    async fn login(&self, username: &str, password: &str) -> ApiResult<String>;

    /// Fetches the identity behind the current token (`GET /admin/user`).
    /// `Ok(None)` means the backend answered but attached no identity.
    async fn current_user(&self) -> ApiResult<Option<AdminUser>>;

    /// Lists generated quizzes (`GET /admin/quizzes`).
    async fn list_quizzes(&self) -> ApiResult<Vec<QuizRecord>>;

    /// Lists registered users (`GET /users/get`).
    async fn list_users(&self) -> ApiResult<Vec<UserRecord>>;

    /// Persists a generated quiz under the operator's identity
    /// (`POST /admin/create/quiz`).
    async fn create_quiz(&self, topic: &str, completion_result: &str) -> ApiResult<()>;

    /// Registers a new user (`POST /user/add`).
    async fn add_user(&self, user: &NewUser) -> ApiResult<()>;
}

/// The external text-generation service that turns a topic into quiz content.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    async fn generate(&self, topic: &str) -> ApiResult<String>;
}

/// The single process-wide source of identity.
///
/// Purely local state; never blocks and never touches the network. Written
/// only by login success (`set`) and the auth gate's failure path (`clear`).
pub trait CredentialStore: Send + Sync {
    /// Returns the current credential, or `None` when anonymous. Expired
    /// credentials are dropped rather than returned.
    fn get(&self) -> Option<Credential>;

    /// Stores a token with an expiry computed from `ttl`.
    fn set(&self, token: &str, ttl: Duration);

    /// Removes the credential immediately.
    fn clear(&self);
}
