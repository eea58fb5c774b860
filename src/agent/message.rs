//! Conversation message model
//!
//! Messages are the unit of history: a role, opaque text, a timestamp and an
//! optional typed attachment. Attachments mark compaction summaries or carry
//! request metrics; they never influence role ordering.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Role of a message in conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    /// Roles allowed to open a normalized tail
    pub fn can_open_tail(&self) -> bool {
        matches!(self, Role::User | Role::Tool)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "tool" => Ok(Role::Tool),
            _ => Err(format!(
                "Unknown role: {}. Use: system, user, assistant, tool",
                s
            )),
        }
    }
}

/// Per-request usage and latency recorded on assistant replies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetrics {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub response_time_ms: f64,
}

/// Typed attachment on a message
///
/// Persisted as a JSON object with a `type` discriminator. Documents written
/// before the discriminator existed stored metrics as
/// `{"response_metrics": {...}, "data": ...}`; those still load as
/// [`MessageMetadata::Metrics`]. Anything unrecognised is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum MessageMetadata {
    /// Marks a compaction summary standing in for `compressed_count` messages
    Summary { compressed_count: usize },
    /// Request metrics, plus the parsed reply when it was JSON
    Metrics {
        metrics: ResponseMetrics,
        data: Option<Value>,
    },
    Other(Map<String, Value>),
}

impl MessageMetadata {
    pub fn summary(compressed_count: usize) -> Self {
        MessageMetadata::Summary { compressed_count }
    }

    pub fn is_summary(&self) -> bool {
        matches!(self, MessageMetadata::Summary { .. })
    }
}

impl TryFrom<Value> for MessageMetadata {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut map) = value else {
            return Err(format!("metadata must be an object, got {}", value));
        };

        let kind = map.get("type").and_then(Value::as_str).map(str::to_owned);
        match kind.as_deref() {
            Some("summary") => {
                let compressed_count = map
                    .get("compressed_count")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| "summary metadata without compressed_count".to_string())?;
                Ok(MessageMetadata::Summary {
                    compressed_count: compressed_count as usize,
                })
            }
            Some("metrics") | None if map.contains_key("response_metrics") => {
                let metrics = map
                    .remove("response_metrics")
                    .map(serde_json::from_value::<ResponseMetrics>)
                    .transpose()
                    .map_err(|e| format!("invalid response_metrics: {}", e))?
                    .unwrap_or_default();
                let data = map.remove("data").filter(|d| !d.is_null());
                Ok(MessageMetadata::Metrics { metrics, data })
            }
            _ => Ok(MessageMetadata::Other(map)),
        }
    }
}

impl From<MessageMetadata> for Value {
    fn from(metadata: MessageMetadata) -> Self {
        match metadata {
            MessageMetadata::Summary { compressed_count } => serde_json::json!({
                "type": "summary",
                "compressed_count": compressed_count,
            }),
            MessageMetadata::Metrics { metrics, data } => {
                let mut map = Map::new();
                map.insert("type".into(), Value::from("metrics"));
                map.insert(
                    "response_metrics".into(),
                    serde_json::to_value(metrics).unwrap_or(Value::Null),
                );
                if let Some(data) = data {
                    map.insert("data".into(), data);
                }
                Value::Object(map)
            }
            MessageMetadata::Other(map) => Value::Object(map),
        }
    }
}

/// A single conversational turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Local::now(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Whether this message is a compaction summary
    pub fn is_summary(&self) -> bool {
        self.metadata.as_ref().is_some_and(MessageMetadata::is_summary)
    }

    /// Reduce to the shape a chat-completion endpoint accepts
    pub fn to_api(&self) -> ApiMessage {
        ApiMessage::new(self.role, self.content.clone())
    }
}

/// Message as sent to a chat-completion endpoint: role and content only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: Role,
    pub content: String,
}

impl ApiMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Timestamp codec
///
/// Writes RFC 3339 with offset. Reads RFC 3339, or a naive
/// `YYYY-MM-DDTHH:MM:SS[.f]` interpreted as local time.
pub mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S>(value: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Local>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Local));
        }
        let naive = NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT).ok()?;
        Local.from_local_datetime(&naive).earliest()
    }
}
