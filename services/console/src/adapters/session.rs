//! services/console/src/adapters/session.rs
//!
//! File-backed credential store: the console's counterpart of the browser's
//! session cookie. One JSON file holding the token and its expiry window.

use std::fs;
use std::path::PathBuf;

use chrono::{Duration, Utc};
use quizr_console_core::{Credential, CredentialStore};

/// A `CredentialStore` persisting the credential across console runs.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<Credential> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let credential: Credential = match serde_json::from_str(&raw) {
            Ok(credential) => credential,
            Err(err) => {
                tracing::warn!(error = %err, path = %self.path.display(), "discarding unreadable session file");
                let _ = fs::remove_file(&self.path);
                return None;
            }
        };
        if credential.is_expired(Utc::now()) {
            let _ = fs::remove_file(&self.path);
            return None;
        }
        Some(credential)
    }

    fn set(&self, token: &str, ttl: Duration) {
        let credential = Credential::issue(token, ttl);
        match serde_json::to_string_pretty(&credential) {
            Ok(json) => {
                if let Err(err) = fs::write(&self.path, json) {
                    tracing::warn!(error = %err, path = %self.path.display(), "failed to persist session");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize session");
            }
        }
    }

    fn clear(&self) {
        let _ = fs::remove_file(&self.path);
    }
}
