//! Compaction policy - decides when and what to fold into a summary
//!
//! Given a message list and a [`CompressAfter`] threshold:
//! - nothing happens while the list is at or below the threshold
//! - otherwise everything older than the last `compress_after` messages is the
//!   prefix, summarized into one `system` message tagged as a summary
//! - the kept tail is normalized so roles alternate after the summary
//!
//! A prefix that is nothing but a previous summary is left alone, so a freshly
//! compacted history is not re-summarized into itself on the next append.

use crate::agent::message::{Message, MessageMetadata, Role};

use super::config::CompressAfter;
use super::summary::Summarizer;
use super::tail::normalize_tail;

/// Range of messages to fold into a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionRange {
    /// End index (exclusive); the range always starts at 0
    pub end: usize,
}

impl EvictionRange {
    pub fn len(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }
}

/// Outcome of a compaction that fired
#[derive(Debug, Clone, PartialEq)]
pub struct Compaction {
    /// Replacement message list: summary first, then the normalized tail
    pub messages: Vec<Message>,
    /// Number of messages folded into the summary
    pub compressed_count: usize,
}

/// Decides whether to compact and assembles the replacement history
#[derive(Debug, Default)]
pub struct CompactionPolicy {
    summarizer: Summarizer,
}

impl CompactionPolicy {
    pub fn new(summarizer: Summarizer) -> Self {
        Self { summarizer }
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    /// Select the prefix to summarize, if compaction should fire
    pub fn eviction_range(messages: &[Message], threshold: CompressAfter) -> Option<EvictionRange> {
        if !threshold.should_compact(messages.len()) {
            return None;
        }

        let range = EvictionRange {
            end: threshold.split_point(messages.len()),
        };
        if range.is_empty() {
            return None;
        }

        // A lone summary would only be summarized into itself
        if range.len() == 1 && messages[0].is_summary() {
            return None;
        }

        Some(range)
    }

    /// Compact `messages` once if the threshold is exceeded
    ///
    /// Returns `None` when no compaction is needed. Input messages are never
    /// modified; the kept tail is cloned into the result.
    pub fn maybe_compact(&self, messages: &[Message], threshold: CompressAfter) -> Option<Compaction> {
        let range = Self::eviction_range(messages, threshold)?;
        let (prefix, tail) = messages.split_at(range.end);

        let summary_text = self.summarizer.summarize_or_fallback(prefix);
        let summary = Message::new(Role::System, summary_text)
            .with_metadata(MessageMetadata::summary(prefix.len()));

        let tail = normalize_tail(tail.to_vec());
        log::info!(
            "Compacted history: {} messages summarized, {} kept",
            prefix.len(),
            tail.len()
        );

        let mut compacted = Vec::with_capacity(tail.len() + 1);
        compacted.push(summary);
        compacted.extend(tail);

        Some(Compaction {
            messages: compacted,
            compressed_count: range.len(),
        })
    }
}
