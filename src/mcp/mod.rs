//! Tool discovery over the Model Context Protocol

pub mod client;
pub mod types;

pub use client::McpClient;
pub use types::{McpTool, ToolParam, ToolSchema};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    #[error("MCP server returned an error: {0}")]
    Rpc(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Tool listing unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
