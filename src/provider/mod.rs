//! Chat-completion provider
//!
//! A blocking client for OpenAI-compatible `/chat/completions` endpoints and
//! the [`CompletionBackend`] seam the chat loop and summarizer call through.

pub mod client;
pub mod error;
pub mod types;

pub use client::ChatClient;
pub use error::{ProviderError, Result};
pub use types::{ChatRequest, ChatResponse, Usage};

/// Anything that can answer a chat-completion request
pub trait CompletionBackend: Send + Sync {
    fn complete(&self, request: &ChatRequest) -> Result<ChatResponse>;
}
