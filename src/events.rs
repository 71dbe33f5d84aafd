//! Core event types shared by the tailer, aggregator and dispatcher
//!
//! A [`LogLine`] is one raw line read from a watched file. A [`LogEntry`] is the
//! group of consecutive lines the aggregator decided belong together and hands
//! off for delivery.

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Timestamp type for consistent time handling across the application
pub type Timestamp = DateTime<Utc>;

/// A single line appended to a watched file
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    /// Line content with the trailing newline removed
    pub text: String,
    /// When the tailer read the line
    pub received_at: Timestamp,
}

impl LogLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

/// A completed log entry, ready for dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Identifier of the file the lines came from
    pub file: Arc<str>,
    /// Lines in arrival order
    pub lines: Vec<String>,
    /// Arrival time of the first line
    pub first_seen: Timestamp,
}

impl LogEntry {
    /// Build an entry from buffered lines
    ///
    /// Returns `None` for an empty buffer, which is never flushed.
    pub fn from_lines(file: Arc<str>, lines: Vec<LogLine>) -> Option<Self> {
        let first_seen = lines.first()?.received_at;
        Some(Self {
            file,
            lines: lines.into_iter().map(|l| l.text).collect(),
            first_seen,
        })
    }

    pub fn first_line(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or_default()
    }

    pub fn last_line(&self) -> &str {
        self.lines.last().map(String::as_str).unwrap_or_default()
    }

    /// True when every line is empty or whitespace
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}
