//! Conversation history with transparent compaction
//!
//! [`ChatHistory`] is the surface the chat loop talks to. It owns the active
//! session's messages and settings and persists the whole session after every
//! mutation:
//! - `append` pushes a message, runs the compaction policy, then saves
//! - settings mutators validate first and leave state untouched on error
//! - `load_session` swaps state only after the document parsed cleanly

use chrono::Local;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use super::compact::{CompactionPolicy, CompressAfter, ThresholdError};
use super::message::{ApiMessage, Message, MessageMetadata, Role};
use super::persistence::{SessionDocument, SessionStore, SessionTokens, StoreError};

/// Valid sampling temperatures
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=2.0;

const RULE_WIDTH: usize = 70;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Threshold(#[from] ThresholdError),

    #[error("temperature must be between 0 and 2, got {0}")]
    InvalidTemperature(f64),

    #[error("max tokens must be a positive integer")]
    InvalidMaxTokens,

    #[error("failed to write export: {0}")]
    Export(#[from] std::io::Error),
}

pub type HistoryResult<T> = std::result::Result<T, HistoryError>;

/// Settings a brand-new session starts with
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDefaults {
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub compress_after: CompressAfter,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            system_prompt: None,
            temperature: Some(0.7),
            max_tokens: None,
            compress_after: CompressAfter::default(),
        }
    }
}

/// Mutable state of the active session
#[derive(Debug, Clone)]
struct SessionState {
    messages: Vec<Message>,
    system_prompt: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    compress_after: CompressAfter,
    tokens: SessionTokens,
}

impl SessionState {
    fn from_defaults(defaults: &SessionDefaults) -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: defaults.system_prompt.clone(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            compress_after: defaults.compress_after,
            tokens: SessionTokens::default(),
        }
    }

    fn from_document(document: SessionDocument) -> Self {
        Self {
            messages: document.messages,
            system_prompt: document.system_prompt,
            temperature: document.temperature,
            max_tokens: document.max_tokens,
            compress_after: document.compress_after,
            tokens: document.session_tokens,
        }
    }

    fn to_document(&self) -> SessionDocument {
        SessionDocument {
            created: Local::now(),
            message_count: self.messages.len(),
            system_prompt: self.system_prompt.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            compress_after: self.compress_after,
            session_tokens: self.tokens,
            messages: self.messages.clone(),
        }
    }
}

/// Append/query/export surface over one active session
pub struct ChatHistory {
    store: SessionStore,
    policy: CompactionPolicy,
    session_name: String,
    state: SessionState,
}

impl ChatHistory {
    /// Start a fresh session and persist it immediately
    pub fn start(
        store: SessionStore,
        policy: CompactionPolicy,
        defaults: &SessionDefaults,
        name: Option<&str>,
    ) -> HistoryResult<Self> {
        let mut history = Self {
            store,
            policy,
            session_name: String::new(),
            state: SessionState::from_defaults(defaults),
        };
        history.create_session(name)?;
        Ok(history)
    }

    /// Open an existing session
    pub fn resume(store: SessionStore, policy: CompactionPolicy, name: &str) -> HistoryResult<Self> {
        let document = store.load(name)?;
        Ok(Self {
            store,
            policy,
            session_name: name.to_string(),
            state: SessionState::from_document(document),
        })
    }

    /// Begin a new empty session, keeping temperature, system prompt and threshold
    ///
    /// Messages, usage counters and the reply token cap are reset. The name
    /// defaults to the current local time as `%Y%m%d_%H%M%S`.
    pub fn create_session(&mut self, name: Option<&str>) -> HistoryResult<PathBuf> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Local::now().format("%Y%m%d_%H%M%S").to_string());

        let mut state = self.state.clone();
        state.messages.clear();
        state.max_tokens = None;
        state.tokens = SessionTokens::default();

        let path = self.store.save(&name, &state.to_document())?;
        self.session_name = name;
        self.state = state;
        log::info!("Created session '{}'", self.session_name);
        Ok(path)
    }

    /// Replace the active session with a stored one
    ///
    /// On any error the current session is left exactly as it was.
    pub fn load_session(&mut self, name: &str) -> HistoryResult<()> {
        let document = self.store.load(name)?;
        self.state = SessionState::from_document(document);
        self.session_name = name.to_string();
        log::info!(
            "Loaded session '{}' ({} messages)",
            name,
            self.state.messages.len()
        );
        Ok(())
    }

    /// Stored session names, most recent first
    pub fn list_sessions(&self) -> HistoryResult<Vec<String>> {
        Ok(self.store.list()?)
    }

    /// Append a message, compact if needed, then persist
    ///
    /// Returns the number of messages folded into a summary when compaction fired.
    pub fn append(
        &mut self,
        role: Role,
        content: impl Into<String>,
        metadata: Option<MessageMetadata>,
    ) -> HistoryResult<Option<usize>> {
        let mut message = Message::new(role, content);
        message.metadata = metadata;

        // Keep timestamps non-decreasing even if the wall clock steps back
        if let Some(last) = self.state.messages.last()
            && message.timestamp < last.timestamp
        {
            message.timestamp = last.timestamp;
        }

        let mut next = self.state.clone();
        next.messages.push(message);

        let folded = self
            .policy
            .maybe_compact(&next.messages, next.compress_after)
            .map(|compaction| {
                next.messages = compaction.messages;
                compaction.compressed_count
            });

        self.commit(next)?;
        Ok(folded)
    }

    /// Messages in the shape a chat-completion endpoint expects
    ///
    /// The system prompt, when set, comes first; metadata and timestamps are dropped.
    pub fn api_messages(&self) -> Vec<ApiMessage> {
        self.state
            .system_prompt
            .iter()
            .map(|prompt| ApiMessage::new(Role::System, prompt.clone()))
            .chain(self.state.messages.iter().map(Message::to_api))
            .collect()
    }

    /// Write a plain-text transcript of the in-memory messages
    ///
    /// Relative file names land in the history directory. Session state is not touched.
    pub fn export(&self, filename: Option<&str>) -> HistoryResult<PathBuf> {
        let filename = filename
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("export_{}.txt", Local::now().format("%Y%m%d_%H%M%S")));

        let path = self.store.dir().join(filename);
        fs::write(&path, self.render_transcript())?;
        log::info!("Exported {} messages to {}", self.state.messages.len(), path.display());
        Ok(path)
    }

    /// Render all messages as a human-readable transcript
    pub fn render_transcript(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let thin = "─".repeat(RULE_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "CHAT HISTORY EXPORT");
        let _ = writeln!(out, "Session:  {}", self.session_name);
        let _ = writeln!(out, "Exported: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "Messages: {}", self.state.messages.len());
        let _ = writeln!(out, "{}\n", rule);

        for (i, message) in self.state.messages.iter().enumerate() {
            let _ = writeln!(
                out,
                "[{}] {} ({})",
                i + 1,
                message.role.as_str().to_uppercase(),
                message.timestamp.to_rfc3339()
            );
            let _ = writeln!(out, "{}", thin);
            let _ = writeln!(out, "{}", message.content);
            if let Some(metadata) = &message.metadata {
                let value = serde_json::Value::from(metadata.clone());
                let pretty = serde_json::to_string_pretty(&value).unwrap_or_default();
                let _ = writeln!(out, "\nJSON: {}", pretty);
            }
            out.push('\n');
        }

        out
    }

    /// Newest `limit` messages, or all of them
    pub fn show_history(&self, limit: Option<usize>) -> &[Message] {
        let messages = &self.state.messages;
        match limit {
            Some(n) if n > 0 && n < messages.len() => &messages[messages.len() - n..],
            _ => messages,
        }
    }

    /// Drop all messages; settings and usage are kept
    pub fn clear(&mut self) -> HistoryResult<()> {
        self.update(|state| state.messages.clear())
    }

    pub fn set_temperature(&mut self, temperature: Option<f64>) -> HistoryResult<()> {
        if let Some(t) = temperature
            && !TEMPERATURE_RANGE.contains(&t)
        {
            return Err(HistoryError::InvalidTemperature(t));
        }
        self.update(|state| state.temperature = temperature)
    }

    /// Set the reply token cap; `None` removes it
    pub fn set_max_tokens(&mut self, max_tokens: Option<u32>) -> HistoryResult<()> {
        if max_tokens == Some(0) {
            return Err(HistoryError::InvalidMaxTokens);
        }
        self.update(|state| state.max_tokens = max_tokens)
    }

    /// Change the compaction threshold; values below the minimum are rejected
    pub fn set_compress_after(&mut self, value: usize) -> HistoryResult<()> {
        let compress_after = CompressAfter::new(value)?;
        self.update(|state| state.compress_after = compress_after)
    }

    /// Replace the system prompt; blank text clears it
    pub fn set_system_prompt(&mut self, prompt: Option<String>) -> HistoryResult<()> {
        let prompt = prompt.filter(|p| !p.trim().is_empty());
        self.update(|state| state.system_prompt = prompt)
    }

    /// Add one request's usage to the session counters
    pub fn update_token_stats(&mut self, prompt: u64, completion: u64, total: u64) -> HistoryResult<()> {
        self.update(|state| state.tokens.add(prompt, completion, total))
    }

    pub fn token_stats(&self) -> SessionTokens {
        self.state.tokens
    }

    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    pub fn len(&self) -> usize {
        self.state.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.messages.is_empty()
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.state.system_prompt.as_deref()
    }

    pub fn temperature(&self) -> Option<f64> {
        self.state.temperature
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.state.max_tokens
    }

    pub fn compress_after(&self) -> CompressAfter {
        self.state.compress_after
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Get a brief status string
    pub fn status(&self) -> String {
        format!(
            "session {} · {} messages · compress after {} · {}",
            self.session_name,
            self.state.messages.len(),
            self.state.compress_after,
            self.state.tokens.format_compact()
        )
    }

    /// Apply `change` to a copy of the state, persist it, then adopt it
    fn update(&mut self, change: impl FnOnce(&mut SessionState)) -> HistoryResult<()> {
        let mut next = self.state.clone();
        change(&mut next);
        self.commit(next)
    }

    /// Adopt `next` only once it is on disk
    fn commit(&mut self, next: SessionState) -> HistoryResult<()> {
        self.store.save(&self.session_name, &next.to_document())?;
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::compact::{SummarizeError, Summarizer};
    use tempfile::{TempDir, tempdir};

    fn history_with(summarizer: Summarizer, compress_after: usize) -> (TempDir, ChatHistory) {
        let dir = tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        let defaults = SessionDefaults {
            compress_after: CompressAfter::new(compress_after).unwrap(),
            ..SessionDefaults::default()
        };
        let history = ChatHistory::start(
            store,
            CompactionPolicy::new(summarizer),
            &defaults,
            Some("test"),
        )
        .unwrap();
        (dir, history)
    }

    fn counting() -> Summarizer {
        Summarizer::with_fn(|m| Ok(format!("folded {}", m.len())))
    }

    #[test]
    fn test_start_persists_immediately() {
        let (dir, history) = history_with(counting(), 12);
        assert!(dir.path().join("test.json").exists());
        assert_eq!(history.session_name(), "test");
        assert_eq!(history.temperature(), Some(0.7));
        assert!(history.is_empty());
    }

    #[test]
    fn test_append_persists_every_message() {
        let (_dir, mut history) = history_with(counting(), 12);
        history.append(Role::User, "hello", None).unwrap();

        let stored = history.store().load("test").unwrap();
        assert_eq!(stored.message_count, 1);
        assert_eq!(stored.messages[0].content, "hello");
    }

    #[test]
    fn test_compaction_scenario_with_threshold_four() {
        let (_dir, mut history) = history_with(counting(), 4);
        let turns = ["u0", "a0", "u1", "a1", "u2", "a2", "u3"];
        let mut folded = Vec::new();

        for (i, text) in turns.iter().enumerate() {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            folded.push(history.append(role, *text, None).unwrap());
        }

        // 5th append: prefix [u0], tail [a0 u1 a1 u2] -> [u1 a1 u2]
        assert_eq!(folded[4], Some(1));
        // 6th append: prefix is the lone summary, left alone
        assert_eq!(folded[5], None);
        // 7th append: prefix [summary, u1], tail [a1 u2 a2 u3] -> [u2 a2 u3]
        assert_eq!(folded[6], Some(2));

        let contents: Vec<&str> = history.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["folded 2", "u2", "a2", "u3"]);
        assert!(history.messages()[0].is_summary());

        let stored = history.store().load("test").unwrap();
        assert_eq!(stored.messages, history.messages());
    }

    #[test]
    fn test_summarizer_failure_is_absorbed() {
        let failing = Summarizer::with_fn(|_| Err(SummarizeError::Custom("down".into())));
        let (_dir, mut history) = history_with(failing, 4);
        for i in 0..5 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            history.append(role, format!("m{}", i), None).unwrap();
        }
        assert!(history.messages()[0].is_summary());
        assert!(history.messages()[0].content.contains("open_questions"));
    }

    #[test]
    fn test_compress_after_below_minimum_is_rejected() {
        let (_dir, mut history) = history_with(counting(), 6);
        let err = history.set_compress_after(3).unwrap_err();
        assert!(matches!(err, HistoryError::Threshold(_)));
        assert_eq!(history.compress_after().get(), 6);

        history.set_compress_after(8).unwrap();
        assert_eq!(history.store().load("test").unwrap().compress_after.get(), 8);
    }

    #[test]
    fn test_settings_validation() {
        let (_dir, mut history) = history_with(counting(), 12);
        assert!(history.set_temperature(Some(2.5)).is_err());
        assert_eq!(history.temperature(), Some(0.7));
        history.set_temperature(Some(1.2)).unwrap();
        assert_eq!(history.temperature(), Some(1.2));

        assert!(history.set_max_tokens(Some(0)).is_err());
        history.set_max_tokens(Some(512)).unwrap();
        assert_eq!(history.store().load("test").unwrap().max_tokens, Some(512));
        history.set_max_tokens(None).unwrap();
        assert_eq!(history.max_tokens(), None);
    }

    #[test]
    fn test_api_messages_put_system_prompt_first() {
        let (_dir, mut history) = history_with(counting(), 12);
        history
            .set_system_prompt(Some("Answer in JSON.".to_string()))
            .unwrap();
        history.append(Role::User, "weather in Oslo", None).unwrap();
        history
            .append(
                Role::Assistant,
                "{}",
                Some(MessageMetadata::Metrics {
                    metrics: Default::default(),
                    data: None,
                }),
            )
            .unwrap();

        let api = history.api_messages();
        assert_eq!(api.len(), 3);
        assert_eq!(api[0], ApiMessage::new(Role::System, "Answer in JSON."));
        assert_eq!(api[1], ApiMessage::new(Role::User, "weather in Oslo"));

        history.set_system_prompt(Some("   ".to_string())).unwrap();
        assert_eq!(history.api_messages().len(), 2);
    }

    #[test]
    fn test_load_failure_leaves_state_untouched() {
        let (dir, mut history) = history_with(counting(), 12);
        history.append(Role::User, "keep me", None).unwrap();
        fs::write(dir.path().join("broken.json"), "{\"messages\": [").unwrap();

        assert!(history.load_session("broken").is_err());
        assert!(history.load_session("missing").is_err());
        assert_eq!(history.session_name(), "test");
        assert_eq!(history.messages()[0].content, "keep me");
    }

    #[test]
    fn test_failed_save_keeps_last_persisted_state() {
        let (dir, mut history) = history_with(counting(), 4);
        for (i, text) in ["u0", "a0", "u1", "a1"].iter().enumerate() {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            history.append(role, *text, None).unwrap();
        }
        fs::remove_dir_all(dir.path()).unwrap();

        // This append would compact; neither the new message nor the summary may stick
        assert!(history.append(Role::User, "u2", None).is_err());
        assert_eq!(history.len(), 4);
        assert!(!history.messages()[0].is_summary());
        assert_eq!(history.messages()[3].content, "a1");

        assert!(history.set_temperature(Some(1.5)).is_err());
        assert_eq!(history.temperature(), Some(0.7));
        assert!(history.set_compress_after(8).is_err());
        assert_eq!(history.compress_after().get(), 4);
        assert!(history.set_system_prompt(Some("new".to_string())).is_err());
        assert!(history.system_prompt().is_none());
        assert!(history.update_token_stats(1, 2, 3).is_err());
        assert_eq!(history.token_stats().request_count, 0);
        assert!(history.clear().is_err());
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn test_create_session_resets_messages_usage_and_cap() {
        let (_dir, mut history) = history_with(counting(), 12);
        history.append(Role::User, "hi", None).unwrap();
        history.update_token_stats(10, 5, 15).unwrap();
        history.set_max_tokens(Some(100)).unwrap();
        history.set_temperature(Some(1.0)).unwrap();

        history.create_session(Some("second")).unwrap();
        assert!(history.is_empty());
        assert_eq!(history.token_stats(), SessionTokens::default());
        assert_eq!(history.max_tokens(), None);
        assert_eq!(history.temperature(), Some(1.0));

        history.load_session("test").unwrap();
        assert_eq!(history.token_stats().request_count, 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.list_sessions().unwrap(), vec!["test", "second"]);
    }

    #[test]
    fn test_export_writes_transcript_without_touching_session() {
        let (dir, mut history) = history_with(counting(), 12);
        history.append(Role::User, "first question", None).unwrap();
        let before = fs::read_to_string(dir.path().join("test.json")).unwrap();

        let path = history.export(Some("out.txt")).unwrap();
        assert_eq!(path, dir.path().join("out.txt"));

        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("[1] USER ("));
        assert!(text.contains("first question"));
        assert_eq!(fs::read_to_string(dir.path().join("test.json")).unwrap(), before);
    }

    #[test]
    fn test_show_history_limits_to_newest() {
        let (_dir, mut history) = history_with(counting(), 12);
        for text in ["a", "b", "c"] {
            history.append(Role::User, text, None).unwrap();
        }
        let shown: Vec<&str> = history
            .show_history(Some(2))
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(shown, vec!["b", "c"]);
        assert_eq!(history.show_history(None).len(), 3);

        history.clear().unwrap();
        assert!(history.is_empty());
        assert_eq!(history.store().load("test").unwrap().message_count, 0);
    }
}
