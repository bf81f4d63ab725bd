//! crates/quizr_console_core/src/credentials.rs
//!
//! In-memory credential store. The runnable console swaps in a file-backed
//! implementation of the same port; tests use this one.

#[cfg(test)]
#[path = "credentials_test.rs"]
mod credentials_test;

use std::sync::Mutex;

use chrono::{Duration, Utc};

use crate::domain::Credential;
use crate::ports::CredentialStore;

/// A `CredentialStore` holding the credential in process memory.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        let mut slot = self.slot.lock().expect("credential store lock poisoned");
        let expired = slot
            .as_ref()
            .map(|c| c.is_expired(Utc::now()))
            .unwrap_or(false);
        if expired {
            *slot = None;
        }
        slot.clone()
    }

    fn set(&self, token: &str, ttl: Duration) {
        let mut slot = self.slot.lock().expect("credential store lock poisoned");
        *slot = Some(Credential::issue(token, ttl));
    }

    fn clear(&self) {
        let mut slot = self.slot.lock().expect("credential store lock poisoned");
        *slot = None;
    }
}
