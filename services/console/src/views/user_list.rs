//! services/console/src/views/user_list.rs
//!
//! The registered-users list: a polling subscriber plus plain-text rendering.

use std::sync::Arc;
use std::time::Duration;

use quizr_console_core::{
    AdminApi, FetchOptions, ResourceKey, ResourcePool, Snapshot, Subscription, UserRecord,
};

pub struct UserListView {
    sub: Subscription<Vec<UserRecord>>,
}

impl UserListView {
    pub fn subscribe(
        pool: &ResourcePool<Vec<UserRecord>>,
        api: Arc<dyn AdminApi>,
        base_url: &str,
        token: &str,
        interval: Duration,
    ) -> Self {
        let key = ResourceKey::new(format!("{base_url}/users/get"), token);
        let sub = pool.subscribe(key, FetchOptions::every(interval), move || {
            let api = api.clone();
            Box::pin(async move { api.list_users().await })
        });
        Self { sub }
    }

    pub fn refresh(&self) {
        self.sub.refresh();
    }

    pub fn render(&self) -> String {
        render(&self.sub.snapshot())
    }
}

fn render(snapshot: &Snapshot<Vec<UserRecord>>) -> String {
    let Some(records) = &snapshot.value else {
        return match &snapshot.error {
            Some(err) => format!("Failed to load users: {err}\n"),
            None => "Loading users...\n".to_owned(),
        };
    };

    let mut out = String::new();
    if records.is_empty() {
        out.push_str("No users yet.\n");
    } else {
        out.push_str(&format!(
            "  {:<24}{:<12}{:<10}{}\n",
            "NAME", "TYPE", "STATUS", "EMAIL"
        ));
        for record in records {
            out.push_str(&format!(
                "  {:<24}{:<12}{:<10}{}\n",
                record.full_name(),
                record.user_type,
                record.status,
                record.email
            ));
        }
    }
    if snapshot.is_stale() {
        if let Some(err) = &snapshot.error {
            out.push_str(&format!("  (showing cached data; last refresh failed: {err})\n"));
        }
    }
    out
}
