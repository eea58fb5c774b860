//! Compaction configuration
//!
//! Defines when compaction should be triggered.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default values for compaction
pub mod defaults {
    /// Smallest retention window that can still hold a user/assistant pair
    /// after the tail is normalized
    pub const MIN_COMPRESS_AFTER: usize = 4;

    /// Default retention window - messages kept verbatim after compaction
    pub const COMPRESS_AFTER: usize = 12;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("compression threshold must be at least {min} messages, got {value}")]
pub struct ThresholdError {
    pub value: usize,
    pub min: usize,
}

/// Number of most recent messages kept uncompressed
///
/// Validated on construction so a live session can never hold a value below
/// [`defaults::MIN_COMPRESS_AFTER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct CompressAfter(usize);

impl CompressAfter {
    pub fn new(value: usize) -> Result<Self, ThresholdError> {
        if value < defaults::MIN_COMPRESS_AFTER {
            return Err(ThresholdError {
                value,
                min: defaults::MIN_COMPRESS_AFTER,
            });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// Check if a history of `message_count` messages should be compacted
    pub fn should_compact(self, message_count: usize) -> bool {
        message_count > self.0
    }

    /// Index splitting the summarized prefix from the kept tail
    pub fn split_point(self, message_count: usize) -> usize {
        message_count.saturating_sub(self.0)
    }
}

impl Default for CompressAfter {
    fn default() -> Self {
        Self(defaults::COMPRESS_AFTER)
    }
}

impl TryFrom<usize> for CompressAfter {
    type Error = ThresholdError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CompressAfter> for usize {
    fn from(value: CompressAfter) -> Self {
        value.0
    }
}

impl fmt::Display for CompressAfter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
