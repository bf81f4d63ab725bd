//! crates/quizr_console_core/src/workflow.rs
//!
//! The multi-stage pipeline turning a topic prompt into a persisted quiz:
//! validate locally, call the generation service, persist the result.
//!
//! Failure handling is asymmetric on purpose, matching the product behavior:
//! a generation failure discards the text, a persistence failure keeps it so
//! the operator can retry the persist step without regenerating.

#[cfg(test)]
#[path = "workflow_test.rs"]
mod workflow_test;

use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::ports::{AdminApi, QuizGenerator};

/// Validation message for a blank topic; shown inline, never sent anywhere.
pub const EMPTY_PROMPT_MESSAGE: &str = "Course cannot be blank. Please enter a valid course.";

/// Phases of one generation attempt. Transitions run strictly forward;
/// `Failed` is reachable from any in-flight phase and only an explicit
/// `reset` returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    Idle,
    Validating,
    Generating,
    Persisting,
    Succeeded,
    Failed,
}

/// Observable state of the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSnapshot {
    pub phase: GenerationPhase,
    pub prompt: String,
    /// Generated quiz text. Discarded on a generation failure, preserved on
    /// a persistence failure and on success.
    pub result: Option<String>,
    pub error: Option<String>,
}

impl WorkflowSnapshot {
    fn idle() -> Self {
        Self {
            phase: GenerationPhase::Idle,
            prompt: String::new(),
            result: None,
            error: None,
        }
    }
}

/// Outcome of a `submit` or `retry_persist` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The attempt ran to a terminal phase; inspect the snapshot.
    Settled,
    /// The prompt failed local validation; no network call was issued.
    Invalid,
    /// Another attempt is in flight, or the workflow needs a reset first.
    Rejected,
}

/// Orchestrates prompt validation, the generation call, and the persistence
/// call for a single dialog instance. One attempt at a time; a submit while
/// a call is in flight is rejected, never queued.
pub struct GenerationWorkflow {
    generator: Arc<dyn QuizGenerator>,
    api: Arc<dyn AdminApi>,
    state: watch::Sender<WorkflowSnapshot>,
    attempt: Mutex<()>,
}

impl GenerationWorkflow {
    pub fn new(generator: Arc<dyn QuizGenerator>, api: Arc<dyn AdminApi>) -> Self {
        let (state, _rx) = watch::channel(WorkflowSnapshot::idle());
        Self {
            generator,
            api,
            state,
            attempt: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribes to state updates, e.g. for a progress indicator.
    pub fn watch(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.state.subscribe()
    }

    /// Runs one generation attempt to a terminal phase.
    pub async fn submit(&self, prompt: &str) -> SubmitOutcome {
        let Ok(_guard) = self.attempt.try_lock() else {
            return SubmitOutcome::Rejected;
        };
        if self.state.borrow().phase != GenerationPhase::Idle {
            return SubmitOutcome::Rejected;
        }

        self.state.send_modify(|s| {
            s.phase = GenerationPhase::Validating;
            s.prompt = prompt.to_owned();
            s.result = None;
            s.error = None;
        });

        let topic = prompt.trim().to_owned();
        if topic.is_empty() {
            self.state.send_modify(|s| {
                s.phase = GenerationPhase::Idle;
                s.error = Some(EMPTY_PROMPT_MESSAGE.to_owned());
            });
            return SubmitOutcome::Invalid;
        }

        self.state
            .send_modify(|s| s.phase = GenerationPhase::Generating);
        tracing::info!(topic = %topic, "requesting quiz generation");
        let text = match self.generator.generate(&topic).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                self.fail("generation service returned an empty completion".to_owned());
                return SubmitOutcome::Settled;
            }
            Err(err) => {
                tracing::warn!(error = %err, "quiz generation failed");
                self.fail(err.to_string());
                return SubmitOutcome::Settled;
            }
        };

        self.state.send_modify(|s| {
            s.phase = GenerationPhase::Persisting;
            s.result = Some(text.clone());
        });
        self.persist(&topic, &text).await;
        SubmitOutcome::Settled
    }

    /// Re-issues only the persistence step after a persist failure. The
    /// generated text is reused; the generation service is not called again.
    pub async fn retry_persist(&self) -> SubmitOutcome {
        let Ok(_guard) = self.attempt.try_lock() else {
            return SubmitOutcome::Rejected;
        };
        let (topic, text) = {
            let current = self.state.borrow();
            if current.phase != GenerationPhase::Failed {
                return SubmitOutcome::Rejected;
            }
            match &current.result {
                Some(text) => (current.prompt.trim().to_owned(), text.clone()),
                None => return SubmitOutcome::Rejected,
            }
        };

        self.state.send_modify(|s| {
            s.phase = GenerationPhase::Persisting;
            s.error = None;
        });
        self.persist(&topic, &text).await;
        SubmitOutcome::Settled
    }

    /// Returns the workflow to `Idle`, clearing prompt, result, and error.
    /// No-op (false) while a call is in flight.
    pub fn reset(&self) -> bool {
        let Ok(_guard) = self.attempt.try_lock() else {
            return false;
        };
        self.state.send_modify(|s| *s = WorkflowSnapshot::idle());
        true
    }

    async fn persist(&self, topic: &str, text: &str) {
        match self.api.create_quiz(topic, text).await {
            Ok(()) => {
                tracing::info!(topic = %topic, "generated quiz persisted");
                self.state.send_modify(|s| {
                    s.phase = GenerationPhase::Succeeded;
                    s.error = None;
                });
            }
            Err(err) => {
                // The generated text stays in the snapshot for a retry.
                tracing::warn!(error = %err, "failed to persist generated quiz");
                self.state.send_modify(|s| {
                    s.phase = GenerationPhase::Failed;
                    s.error = Some(err.to_string());
                });
            }
        }
    }

    fn fail(&self, message: String) {
        self.state.send_modify(|s| {
            s.phase = GenerationPhase::Failed;
            s.result = None;
            s.error = Some(message);
        });
    }
}
