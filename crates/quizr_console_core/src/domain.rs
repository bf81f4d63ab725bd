//! crates/quizr_console_core/src/domain.rs
//!
//! Defines the pure, core data structures for the console.
//! These structs are independent of any transport; the serde attributes only
//! pin the backend wire names (camelCase envelopes from the admin API).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a backend session lives from the moment the token is issued.
/// Matches the observed backend session length.
pub fn session_ttl() -> Duration {
    Duration::hours(8)
}

/// A bearer token together with its issue and expiry stamps.
///
/// At most one credential is active per console session; absence of a
/// credential is the anonymous state, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Creates a credential issued now, expiring after `ttl`.
    pub fn issue(token: impl Into<String>, ttl: Duration) -> Self {
        let issued_at = Utc::now();
        Self {
            token: token.into(),
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// The identity payload returned by `GET /admin/user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub username: String,
}

/// A generated quiz as stored by the backend. Read-only projection; the
/// console never validates its shape beyond what it renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizRecord {
    pub id: serde_json::Value,
    pub username: String,
    pub topic: String,
    pub content: String,
}

/// A registered user as stored by the backend. Read-only projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserRecord {
    pub student_id: serde_json::Value,
    pub degree_code: String,
    pub degree_name: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "type")]
    pub user_type: String,
    pub status: String,
    pub email: String,
    pub country_code: String,
    pub phone: String,
    pub gender: String,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The registration payload for `POST /user/add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub password: String,
    #[serde(rename = "type")]
    pub user_type: String,
    /// Only meaningful for students; professors carry no degree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree_code: Option<String>,
    pub country_code: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
}
