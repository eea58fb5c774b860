use std::path::PathBuf;
use thiserror::Error;

use crate::agent::AgentError;
use crate::agent::history::HistoryError;
use crate::agent::persistence::StoreError;
use crate::mcp::DiscoveryError;
use crate::provider::ProviderError;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Session error: {0}")]
    Store(#[from] StoreError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration parsing failed: {0}")]
    ParsingFailed(String),
}

pub type Result<T> = std::result::Result<T, ChatError>;
