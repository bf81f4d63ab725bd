//! services/console/src/adapters/generation.rs
//!
//! This module contains the adapter for the quiz-generation LLM.
//! It implements the `QuizGenerator` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = "You are a quiz generator for a college administration portal. \
You write clear, fair multiple choice questions for the requested course topic. \
Each question has exactly four options labelled A through D and states the correct \
answer on its own line after the options. Use Markdown: one heading per question, \
the options as a bulleted or ordered list. Do not include commentary outside the quiz itself.";

const USER_INPUT_TEMPLATE: &str = "Generate 2 questions as multiple choice for a college-level \
{topic} course with answers. Put each multiple choice in either a bulleted list or ordered list.";

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use quizr_console_core::{ApiError, ApiResult, QuizGenerator};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `QuizGenerator` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiQuizAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiQuizAdapter {
    /// Creates a new `OpenAiQuizAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    fn user_input(topic: &str) -> String {
        USER_INPUT_TEMPLATE.replace("{topic}", topic)
    }
}

fn map_openai_error(err: OpenAIError) -> ApiError {
    match err {
        OpenAIError::Reqwest(e) => ApiError::Network(e.to_string()),
        other => ApiError::Server {
            status: 502,
            message: other.to_string(),
        },
    }
}

//=========================================================================================
// `QuizGenerator` Trait Implementation
//=========================================================================================

#[async_trait]
impl QuizGenerator for OpenAiQuizAdapter {
    /// Produces quiz content for a course topic. The completion is used
    /// verbatim as the quiz body; an empty completion is the workflow's
    /// problem to classify, not this adapter's.
    async fn generate(&self, topic: &str) -> ApiResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(map_openai_error)?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(Self::user_input(topic))
                .build()
                .map_err(map_openai_error)?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(map_openai_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        Ok(content)
    }
}
