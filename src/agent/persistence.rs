//! Session persistence for conversation history
//!
//! Each session is one pretty-printed JSON document in the history directory,
//! named `<session>.json`. Documents are rewritten in full on every mutation.
//!
//! ## Storage Location
//! `<history dir>/<session>.json`, where the history directory defaults to
//! `./chat_history`.
//!
//! ## Features
//! - Atomic saves (temp file in the same directory, then rename)
//! - Session listing, newest name first
//! - Loading documents written by older versions of the client

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::compact::CompressAfter;
use super::message::Message;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session '{0}' not found")]
    NotFound(String),

    #[error("invalid session name '{0}': use letters, digits, '-' or '_' without path separators")]
    InvalidName(String),

    #[error("session '{name}' is not a valid session document: {source}")]
    Corrupt {
        name: String,
        source: serde_json::Error,
    },

    #[error("failed to serialize session: {0}")]
    Serialize(serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Cumulative token usage for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub request_count: u64,
}

impl SessionTokens {
    /// Add one request's usage; counters only grow
    pub fn add(&mut self, prompt: u64, completion: u64, total: u64) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(prompt);
        self.completion_tokens = self.completion_tokens.saturating_add(completion);
        self.total_tokens = self.total_tokens.saturating_add(total);
        self.request_count = self.request_count.saturating_add(1);
    }

    /// Format as compact display string
    pub fn format_compact(&self) -> String {
        format!(
            "{} requests, {} tokens ({} prompt / {} completion)",
            self.request_count, self.total_tokens, self.prompt_tokens, self.completion_tokens
        )
    }
}

fn default_temperature() -> Option<f64> {
    Some(0.7)
}

/// On-disk representation of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    /// Stamped on every save
    #[serde(with = "super::message::timestamp")]
    pub created: DateTime<Local>,
    #[serde(default)]
    pub message_count: usize,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub compress_after: CompressAfter,
    #[serde(default)]
    pub session_tokens: SessionTokens,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Session information for display and selection
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub name: String,
    pub file_path: PathBuf,
    /// Last save time, if the document could be read
    pub saved_at: Option<DateTime<Local>>,
    pub message_count: Option<usize>,
}

/// Reads and writes session documents in one directory
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Open a store, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document for `name`
    pub fn path_for(&self, name: &str) -> StoreResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{}.json", name)))
    }

    /// Write a document atomically
    pub fn save(&self, name: &str, document: &SessionDocument) -> StoreResult<PathBuf> {
        let path = self.path_for(name)?;
        let json = serde_json::to_string_pretty(document).map_err(StoreError::Serialize)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        log::debug!(
            "Saved session '{}' ({} messages) to {}",
            name,
            document.message_count,
            path.display()
        );
        Ok(path)
    }

    /// Read and parse a document
    pub fn load(&self, name: &str) -> StoreResult<SessionDocument> {
        let path = self.path_for(name)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let document = serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            name: name.to_string(),
            source,
        })?;
        log::debug!("Loaded session '{}' from {}", name, path.display());
        Ok(document)
    }

    /// Session names, most recent first by name ordering
    pub fn list(&self) -> StoreResult<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .filter(|name| validate_name(name).is_ok())
            .collect();

        names.sort_by(|a, b| b.cmp(a));
        Ok(names)
    }

    /// List sessions with whatever details their documents provide
    pub fn list_sessions(&self) -> StoreResult<Vec<SessionInfo>> {
        Ok(self
            .list()?
            .into_iter()
            .map(|name| {
                let file_path = self.dir.join(format!("{}.json", name));
                let document = self.load(&name).ok();
                SessionInfo {
                    saved_at: document.as_ref().map(|d| d.created),
                    message_count: document.as_ref().map(|d| d.messages.len()),
                    name,
                    file_path,
                }
            })
            .collect())
    }
}

/// Names become file stems, so they must stay inside the store directory
fn validate_name(name: &str) -> StoreResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control);
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

/// Format relative time for display
pub fn format_relative_time(time: DateTime<Local>) -> String {
    let now = Local::now();
    let duration = now.signed_duration_since(time);

    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 30 {
        format!("{}d ago", duration.num_days())
    } else {
        time.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::{MessageMetadata, ResponseMetrics, Role};
    use tempfile::tempdir;

    fn document() -> SessionDocument {
        let messages = vec![
            Message::new(Role::System, "goals: []").with_metadata(MessageMetadata::summary(6)),
            Message::new(Role::User, "What changed in v2.1?"),
            Message::new(Role::Assistant, "{\n  \"changes\": 3\n}").with_metadata(
                MessageMetadata::Metrics {
                    metrics: ResponseMetrics {
                        prompt_tokens: 120,
                        completion_tokens: 30,
                        total_tokens: 150,
                        response_time_ms: 912.25,
                    },
                    data: Some(serde_json::json!({"changes": 3})),
                },
            ),
        ];

        SessionDocument {
            created: Local::now(),
            message_count: messages.len(),
            system_prompt: Some("Answer briefly.".to_string()),
            temperature: Some(0.5),
            max_tokens: Some(256),
            compress_after: CompressAfter::new(6).unwrap(),
            session_tokens: SessionTokens {
                prompt_tokens: 120,
                completion_tokens: 30,
                total_tokens: 150,
                request_count: 1,
            },
            messages,
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        let original = document();

        let path = store.save("20250101_120000", &original).unwrap();
        assert!(path.exists());

        let loaded = store.load("20250101_120000").unwrap();
        assert_eq!(loaded.messages, original.messages);
        assert_eq!(loaded.system_prompt, original.system_prompt);
        assert_eq!(loaded.temperature, original.temperature);
        assert_eq!(loaded.max_tokens, original.max_tokens);
        assert_eq!(loaded.compress_after, original.compress_after);
        assert_eq!(loaded.session_tokens, original.session_tokens);
    }

    #[test]
    fn test_document_field_names() {
        let json = serde_json::to_value(document()).unwrap();
        for key in [
            "created",
            "message_count",
            "system_prompt",
            "temperature",
            "max_tokens",
            "compress_after",
            "session_tokens",
            "messages",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["session_tokens"]["request_count"], 1);
        assert_eq!(json["messages"][0]["metadata"]["type"], "summary");
        assert!(json["messages"][1].get("metadata").is_none());
    }

    #[test]
    fn test_list_is_reverse_name_order() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        for name in ["20240101_090000", "20250301_101500", "20241231_235959"] {
            store.save(name, &document()).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "not a session").unwrap();

        assert_eq!(
            store.list().unwrap(),
            vec!["20250301_101500", "20241231_235959", "20240101_090000"]
        );
    }

    #[test]
    fn test_load_missing_and_corrupt() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();

        assert!(matches!(store.load("nope"), Err(StoreError::NotFound(_))));

        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        assert!(matches!(store.load("broken"), Err(StoreError::Corrupt { .. })));

        let infos = store.list_sessions().unwrap();
        assert_eq!(infos.len(), 1);
        assert!(infos[0].message_count.is_none());
    }

    #[test]
    fn test_rejects_path_like_names() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        for name in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(
                store.save(name, &document()),
                Err(StoreError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn test_loads_documents_from_older_clients() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        let legacy = r#"{
            "created": "2025-02-10T08:00:00.000001",
            "message_count": 2,
            "system_prompt": null,
            "temperature": 0.7,
            "max_tokens": null,
            "compress_after": 12,
            "session_tokens": {"prompt_tokens": 5, "completion_tokens": 7, "total_tokens": 12, "request_count": 1},
            "messages": [
                {"role": "user", "content": "weather?", "timestamp": "2025-02-10T08:00:00.000002"},
                {"role": "assistant", "content": "{}", "timestamp": "2025-02-10T08:00:01.5",
                 "metadata": {"data": {}, "response_metrics": {"response_time_ms": 1500.0,
                  "prompt_tokens": 5, "completion_tokens": 7, "total_tokens": 12}}}
            ]
        }"#;
        fs::write(dir.path().join("legacy.json"), legacy).unwrap();

        let loaded = store.load("legacy").unwrap();
        assert_eq!(loaded.messages.len(), 2);
        assert!(matches!(
            loaded.messages[1].metadata,
            Some(MessageMetadata::Metrics { .. })
        ));
        assert_eq!(loaded.session_tokens.total_tokens, 12);
    }

    #[test]
    fn test_token_counters_accumulate() {
        let mut tokens = SessionTokens::default();
        tokens.add(10, 5, 15);
        tokens.add(3, 2, 5);
        assert_eq!(tokens.total_tokens, 20);
        assert_eq!(tokens.request_count, 2);
        assert!(tokens.format_compact().contains("2 requests"));
    }

    #[test]
    fn test_format_relative_time() {
        let now = Local::now();
        assert_eq!(format_relative_time(now), "just now");
        assert_eq!(format_relative_time(now - chrono::Duration::hours(1)), "1h ago");
        assert_eq!(format_relative_time(now - chrono::Duration::days(1)), "1d ago");
    }
}
