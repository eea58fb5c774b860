use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::agent::compact::CompressAfter;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub summarizer: SummarizerSettings,
    #[serde(default)]
    pub mcp: McpConfig,
}

/// Chat-completion endpoint and generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
    pub request_timeout_secs: u64,
    /// Extra top-level fields sent with every chat request
    pub extra_body: Map<String, Value>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        let mut extra_body = Map::new();
        extra_body.insert("disable_search".to_string(), Value::Bool(true));

        Self {
            base_url: "https://api.perplexity.ai".to_string(),
            model: "sonar-pro".to_string(),
            api_key_env: "API_KEY".to_string(),
            temperature: 0.7,
            max_tokens: None,
            system_prompt: None,
            request_timeout_secs: 60,
            extra_body,
        }
    }
}

/// Where sessions live and when they compact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub dir: PathBuf,
    pub compress_after: CompressAfter,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("chat_history"),
            compress_after: CompressAfter::default(),
        }
    }
}

/// Model-backed summarization used during compaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerSettings {
    /// Use the chat endpoint for summaries; when false only the local digest is used
    pub enabled: bool,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Length target stated in the summary prompt
    pub token_budget: u32,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "sonar".to_string(),
            temperature: 0.2,
            max_tokens: 600,
            token_budget: 400,
        }
    }
}

/// Tool-discovery (MCP) server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://0.0.0.0:8000".to_string(),
            timeout_secs: 10,
        }
    }
}
