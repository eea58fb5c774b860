//! Summary generation for compacted context
//!
//! A [`Summarizer`] turns a run of older messages into one block of text.
//! Three backends are supported:
//! - a caller-supplied function, trusted as-is
//! - a chat-completion model, prompted with a fixed summary contract
//! - nothing at all, in which case every call fails with `Unconfigured`
//!
//! `summarize` reports failures as [`SummarizeError`]. Compaction goes through
//! [`Summarizer::summarize_or_fallback`], which swaps any failure for a
//! deterministic local digest so history is never lost.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::agent::message::{ApiMessage, Message, Role};
use crate::config::SummarizerSettings;
use crate::provider::{ChatRequest, CompletionBackend, ProviderError};

/// Characters of each message kept in the fallback digest
pub const FALLBACK_SNIPPET_CHARS: usize = 160;

/// Field labels every summary is expected to carry
pub const SUMMARY_FIELDS: [&str; 5] = ["goals", "decisions", "constraints", "open_questions", "todos"];

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("no summarization backend configured")]
    Unconfigured,

    #[error("custom summarizer failed: {0}")]
    Custom(String),

    #[error("summarization request failed: {0}")]
    Backend(#[from] ProviderError),

    #[error("summarization model returned an empty response")]
    EmptyResponse,
}

/// Caller-supplied summarization function
pub type SummaryFn = Box<dyn Fn(&[Message]) -> Result<String, SummarizeError> + Send + Sync>;

enum Backend {
    Custom(SummaryFn),
    Model {
        client: Arc<dyn CompletionBackend>,
        settings: SummarizerSettings,
    },
    Unconfigured,
}

/// Produces summary text for a slice of messages
pub struct Summarizer {
    backend: Backend,
}

impl Summarizer {
    /// A summarizer with no backend; always falls back to the local digest
    pub fn unconfigured() -> Self {
        Self {
            backend: Backend::Unconfigured,
        }
    }

    /// Summarize through a chat-completion model
    pub fn with_model(client: Arc<dyn CompletionBackend>, settings: SummarizerSettings) -> Self {
        Self {
            backend: Backend::Model { client, settings },
        }
    }

    /// Summarize with a custom function whose output is used unmodified
    pub fn with_fn<F>(f: F) -> Self
    where
        F: Fn(&[Message]) -> Result<String, SummarizeError> + Send + Sync + 'static,
    {
        Self {
            backend: Backend::Custom(Box::new(f)),
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self.backend, Backend::Unconfigured)
    }

    /// Summarize `messages`, reporting why it could not be done
    pub fn summarize(&self, messages: &[Message]) -> Result<String, SummarizeError> {
        match &self.backend {
            Backend::Custom(f) => f(messages),
            Backend::Model { client, settings } => {
                let request = ChatRequest::new(
                    settings.model.clone(),
                    build_summary_prompt(messages, settings.token_budget),
                )
                .temperature(Some(settings.temperature))
                .max_tokens(Some(settings.max_tokens));

                log::debug!(
                    "Summarizing {} messages with model {}",
                    messages.len(),
                    settings.model
                );

                let response = client.complete(&request)?;
                let text = response.content().map(str::trim).unwrap_or_default();
                if text.is_empty() {
                    return Err(SummarizeError::EmptyResponse);
                }
                Ok(text.to_string())
            }
            Backend::Unconfigured => Err(SummarizeError::Unconfigured),
        }
    }

    /// Summarize `messages`, degrading to [`fallback_summary`] on any failure
    pub fn summarize_or_fallback(&self, messages: &[Message]) -> String {
        match self.summarize(messages) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Model summarization failed, using local digest: {}", e);
                fallback_summary(messages)
            }
        }
    }
}

impl Default for Summarizer {
    fn default() -> Self {
        Self::unconfigured()
    }
}

impl fmt::Debug for Summarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backend = match &self.backend {
            Backend::Custom(_) => "custom".to_string(),
            Backend::Model { settings, .. } => format!("model({})", settings.model),
            Backend::Unconfigured => "unconfigured".to_string(),
        };
        f.debug_struct("Summarizer").field("backend", &backend).finish()
    }
}

/// Build the two-message prompt sent to the summarization model
///
/// The token budget is stated to the model only; nothing enforces it.
pub fn build_summary_prompt(messages: &[Message], token_budget: u32) -> Vec<ApiMessage> {
    let transcript = messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");

    let instructions = format!(
        "You maintain the running summary of a long conversation. \
         Compress the dialogue you are given into at most {budget} tokens. \
         The summary must cover: the user's or project's goals; decisions made and key conclusions; \
         important constraints such as versions, deadlines, budgets and API limits; \
         open questions and TODO items. \
         Rules: do not add new facts. Keep exact terms, versions, ticket and issue numbers, \
         file paths and key commands verbatim. \
         If an important detail risks being lost, include it as a short quote. \
         Format: a bullet list or JSON with the fields {fields}. \
         Be brief. Do not add new facts.",
        budget = token_budget,
        fields = SUMMARY_FIELDS.join(", "),
    );

    let request = format!(
        "Compress the conversation history below, following the format and limits.\n\nHistory:\n{}",
        transcript
    );

    vec![
        ApiMessage::new(Role::System, instructions),
        ApiMessage::new(Role::User, request),
    ]
}

/// Deterministic digest used when no model summary is available
pub fn fallback_summary(messages: &[Message]) -> String {
    let digest = messages
        .iter()
        .map(|m| format!("- {}: {}", m.role, snippet(&m.content, FALLBACK_SNIPPET_CHARS)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "goals: []\n\
         decisions: []\n\
         constraints: []\n\
         open_questions: []\n\
         todos: [\"Model summarization unavailable. Brief overview:\\n{}\"]",
        digest
    )
}

/// First `max_chars` characters of `text`
fn snippet(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
