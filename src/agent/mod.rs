//! Console chat agent with persistent, self-compacting history
//!
//! # Features
//!
//! - **Session Persistence**: Every change is written to `<history dir>/<session>.json`
//! - **Automatic Compaction**: Older turns are folded into a summary once the
//!   message count passes the configured threshold
//! - **Slash Commands**: Inspect and tune the session without leaving the chat
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode with a fresh session
//! parley chat
//!
//! # Resume a stored session
//! parley chat --session 20250101_120000
//! ```
//!
//! # Interactive Commands
//!
//! - `/show [N]` - Show recent history
//! - `/limit N` - Change the compaction threshold
//! - `/tokens` - Show session token usage
//! - `/help` - Show available commands
//! - `/exit` - Exit the chat

pub mod commands;
pub mod compact;
pub mod history;
pub mod message;
pub mod persistence;
pub mod session;
pub mod ui;

use std::sync::Arc;

use crate::config::Config;
use crate::mcp::DiscoveryError;
use crate::provider::{ChatClient, CompletionBackend, ProviderError};
use compact::{CompactionPolicy, Summarizer};
use history::{ChatHistory, HistoryError, SessionDefaults};
use persistence::SessionStore;
use session::{ChatSession, ChatSettings};

/// Error types for the agent
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Completion request failed: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("Tool discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Input error: {0}")]
    Input(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Which session the chat should open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChoice {
    /// Start a new session, optionally named
    New(Option<String>),
    /// Resume a stored session
    Resume(String),
}

/// Build the summarizer compaction will use
pub fn build_summarizer(config: &Config, backend: Arc<dyn CompletionBackend>) -> Summarizer {
    if config.summarizer.enabled {
        Summarizer::with_model(backend, config.summarizer.clone())
    } else {
        log::debug!("Model summarization disabled; compaction uses the local digest");
        Summarizer::unconfigured()
    }
}

/// Open the requested session over `store`
pub fn open_history(
    config: &Config,
    store: SessionStore,
    summarizer: Summarizer,
    choice: &SessionChoice,
) -> AgentResult<ChatHistory> {
    let policy = CompactionPolicy::new(summarizer);
    let history = match choice {
        SessionChoice::New(name) => {
            let defaults = SessionDefaults {
                system_prompt: config.chat.system_prompt.clone(),
                temperature: Some(config.chat.temperature),
                max_tokens: config.chat.max_tokens,
                compress_after: config.history.compress_after,
            };
            ChatHistory::start(store, policy, &defaults, name.as_deref())?
        }
        SessionChoice::Resume(name) => ChatHistory::resume(store, policy, name)?,
    };
    Ok(history)
}

/// Run the interactive chat until the user exits
pub fn run_interactive(config: &Config, choice: &SessionChoice) -> AgentResult<()> {
    let client: Arc<dyn CompletionBackend> = Arc::new(ChatClient::from_config(&config.chat)?);
    let store = SessionStore::open(&config.history.dir).map_err(HistoryError::from)?;
    let summarizer = build_summarizer(config, client.clone());
    let history = open_history(config, store, summarizer, choice)?;

    let settings = ChatSettings {
        model: config.chat.model.clone(),
        extra_body: config.chat.extra_body.clone(),
    };
    let mut session = ChatSession::new(history, client, settings, config.mcp.clone());
    session.run()
}
