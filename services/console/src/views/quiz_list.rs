//! services/console/src/views/quiz_list.rs
//!
//! The generated-quizzes list: a polling subscriber plus plain-text rendering.

use std::sync::Arc;
use std::time::Duration;

use quizr_console_core::{
    AdminApi, FetchOptions, QuizRecord, ResourceKey, ResourcePool, Snapshot, Subscription,
};

pub struct QuizListView {
    sub: Subscription<Vec<QuizRecord>>,
}

impl QuizListView {
    /// Subscribes to the quiz list resource at the given cadence.
    pub fn subscribe(
        pool: &ResourcePool<Vec<QuizRecord>>,
        api: Arc<dyn AdminApi>,
        base_url: &str,
        token: &str,
        interval: Duration,
    ) -> Self {
        let key = ResourceKey::new(format!("{base_url}/admin/quizzes"), token);
        let sub = pool.subscribe(key, FetchOptions::every(interval), move || {
            let api = api.clone();
            Box::pin(async move { api.list_quizzes().await })
        });
        Self { sub }
    }

    /// Asks for an immediate revalidation, e.g. right after a quiz is
    /// persisted, instead of waiting for the next tick.
    pub fn refresh(&self) {
        self.sub.refresh();
    }

    pub fn render(&self) -> String {
        render(&self.sub.snapshot())
    }

    /// Full content of one quiz, by its position in the rendered table.
    pub fn detail(&self, index: usize) -> Option<String> {
        let snapshot = self.sub.snapshot();
        let record = snapshot.value.as_ref()?.get(index)?;
        Some(format!(
            "Name: {}\nTopic: {}\nContent:\n{}",
            record.username, record.topic, record.content
        ))
    }
}

fn render(snapshot: &Snapshot<Vec<QuizRecord>>) -> String {
    let Some(records) = &snapshot.value else {
        return match &snapshot.error {
            Some(err) => format!("Failed to load quizzes: {err}\n"),
            None => "Loading quizzes...\n".to_owned(),
        };
    };

    let mut out = String::new();
    if records.is_empty() {
        out.push_str("No quizzes yet.\n");
    } else {
        out.push_str(&format!("  {:<4}{:<20}{}\n", "#", "NAME", "TOPIC"));
        for (i, record) in records.iter().enumerate() {
            out.push_str(&format!("  {:<4}{:<20}{}\n", i, record.username, record.topic));
        }
    }
    if snapshot.is_stale() {
        if let Some(err) = &snapshot.error {
            out.push_str(&format!("  (showing cached data; last refresh failed: {err})\n"));
        }
    }
    out
}
