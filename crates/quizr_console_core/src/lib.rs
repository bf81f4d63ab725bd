pub mod auth;
pub mod credentials;
pub mod domain;
pub mod poll;
pub mod ports;
pub mod workflow;

pub use auth::{derive_auth_status, AuthGate, AuthStatus};
pub use credentials::MemoryCredentialStore;
pub use domain::{session_ttl, AdminUser, Credential, NewUser, QuizRecord, UserRecord};
pub use poll::{FetchOptions, ResourceKey, ResourcePool, Snapshot, Subscription};
pub use ports::{AdminApi, ApiError, ApiResult, CredentialStore, QuizGenerator};
pub use workflow::{GenerationPhase, GenerationWorkflow, SubmitOutcome, WorkflowSnapshot};
