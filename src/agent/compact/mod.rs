//! History compaction
//!
//! Keeps a conversation within a bounded number of messages:
//! - a message-count threshold decides when to compact
//! - older messages are folded into a single summary turn
//! - the kept tail is normalized so speaker roles alternate

mod config;
pub mod strategy;
pub mod summary;
pub mod tail;

pub use config::{CompressAfter, ThresholdError, defaults};
pub use strategy::{Compaction, CompactionPolicy, EvictionRange};
pub use summary::{SummarizeError, Summarizer, SummaryFn, build_summary_prompt, fallback_summary};
pub use tail::{is_normalized, normalize_tail};
