//! services/console/src/adapters/backend.rs
//!
//! This module contains the adapter for the admin backend.
//! It implements the `AdminApi` port from the `core` crate over HTTP, reading
//! the bearer token from the injected credential store on every call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quizr_console_core::{
    AdminApi, AdminUser, ApiError, ApiResult, CredentialStore, NewUser, QuizRecord, UserRecord,
};
use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::ConsoleError;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `AdminApi` against the quiz backend.
#[derive(Clone)]
pub struct HttpAdminApi {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
}

impl HttpAdminApi {
    /// Creates a new `HttpAdminApi`. Every request is bounded by `timeout`;
    /// an elapsed timeout surfaces as `ApiError::Network`.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ConsoleError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConsoleError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            store,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request with the uniform headers and maps the response into
    /// the port taxonomy. Clearing a rejected credential is the auth gate's
    /// decision, never this adapter's.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        authenticated: bool,
    ) -> ApiResult<Value> {
        let mut request = request.header(header::CONTENT_TYPE, "application/json");
        if authenticated {
            let token = self
                .store
                .get()
                .map(|c| c.token)
                .unwrap_or_default();
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Auth);
        }
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Server {
            status: status.as_u16(),
            message: format!("invalid response body: {e}"),
        })
    }
}

//=========================================================================================
// Response Envelope Helpers
//=========================================================================================

/// Pulls the backend's `{"message": ...}` out of an error body, falling back
/// to the raw body or the status phrase.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_owned()
            } else {
                trimmed.to_owned()
            }
        })
}

/// Unwraps the `{"result": [...]}` collection envelope. A missing or null
/// `result` is an empty collection, not an error.
fn parse_collection<T: DeserializeOwned>(value: &Value) -> ApiResult<Vec<T>> {
    match value.get("result") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(result) => serde_json::from_value(result.clone()).map_err(|e| ApiError::Server {
            status: 200,
            message: format!("malformed collection payload: {e}"),
        }),
    }
}

/// Unwraps the `{"user": {...}}` identity envelope. An absent or null user
/// means the backend answered with no identity attached.
fn parse_identity(value: &Value) -> ApiResult<Option<AdminUser>> {
    match value.get("user") {
        None | Some(Value::Null) => Ok(None),
        Some(user) => serde_json::from_value(user.clone())
            .map(Some)
            .map_err(|e| ApiError::Server {
                status: 200,
                message: format!("malformed identity payload: {e}"),
            }),
    }
}

//=========================================================================================
// `AdminApi` Trait Implementation
//=========================================================================================

#[async_trait]
impl AdminApi for HttpAdminApi {
    async fn login(&self, username: &str, password: &str) -> ApiResult<String> {
        let body = json!({ "username": username, "password": password });
        let value = self
            .send(self.http.post(self.url("/admin/login")).json(&body), false)
            .await?;
        value
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| ApiError::Server {
                status: 200,
                message: "login response carried no token".to_owned(),
            })
    }

    async fn current_user(&self) -> ApiResult<Option<AdminUser>> {
        let value = self
            .send(self.http.get(self.url("/admin/user")), true)
            .await?;
        parse_identity(&value)
    }

    async fn list_quizzes(&self) -> ApiResult<Vec<QuizRecord>> {
        let value = self
            .send(self.http.get(self.url("/admin/quizzes")), true)
            .await?;
        parse_collection(&value)
    }

    async fn list_users(&self) -> ApiResult<Vec<UserRecord>> {
        let value = self
            .send(self.http.get(self.url("/users/get")), true)
            .await?;
        parse_collection(&value)
    }

    async fn create_quiz(&self, topic: &str, completion_result: &str) -> ApiResult<()> {
        let body = json!({ "prompt": topic, "completionResult": completion_result });
        self.send(
            self.http.post(self.url("/admin/create/quiz")).json(&body),
            true,
        )
        .await?;
        Ok(())
    }

    async fn add_user(&self, user: &NewUser) -> ApiResult<()> {
        self.send(self.http.post(self.url("/user/add")).json(user), true)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_the_backend_envelope() {
        let body = r#"{"message": "Invalid credentials"}"#;
        assert_eq!(
            error_message(StatusCode::UNPROCESSABLE_ENTITY, body),
            "Invalid credentials"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream exploded"),
            "upstream exploded"
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "  "),
            "Internal Server Error"
        );
    }

    #[test]
    fn parse_collection_unwraps_the_result_envelope() {
        let value = serde_json::json!({
            "result": [
                { "id": 7, "username": "admin", "topic": "Algebra", "content": "1. ..." },
                { "topic": "History" }
            ]
        });
        let records: Vec<QuizRecord> = parse_collection(&value).expect("records");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].topic, "Algebra");
        assert_eq!(records[1].username, "", "missing fields default");
    }

    #[test]
    fn parse_collection_treats_a_missing_result_as_empty() {
        let value = serde_json::json!({ "status": "ok" });
        let records: Vec<QuizRecord> = parse_collection(&value).expect("records");
        assert!(records.is_empty());
    }

    #[test]
    fn parse_identity_handles_present_and_absent_users() {
        let present = serde_json::json!({ "user": { "username": "admin" } });
        assert_eq!(
            parse_identity(&present).expect("identity"),
            Some(AdminUser {
                username: "admin".to_owned()
            })
        );

        let absent = serde_json::json!({ "user": null });
        assert_eq!(parse_identity(&absent).expect("identity"), None);
        assert_eq!(parse_identity(&Value::Null).expect("identity"), None);
    }

    #[test]
    fn parse_identity_rejects_a_malformed_user() {
        let malformed = serde_json::json!({ "user": [1, 2, 3] });
        assert!(matches!(
            parse_identity(&malformed),
            Err(ApiError::Server { status: 200, .. })
        ));
    }
}
