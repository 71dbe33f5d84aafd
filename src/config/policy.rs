use std::time::Duration;

/// Segmentation and tailing policy shared by every aggregator
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationPolicy {
    /// Flush once this many lines are buffered; 0 disables the limit
    pub max_lines: usize,
    /// Lines required before the idle timer may flush; always at least 1
    pub min_lines: usize,
    /// Idle time after which a partial entry is flushed
    pub timeout: Duration,
    /// Begin tailing at end-of-file instead of the beginning
    pub start_at_end: bool,
    /// Follow the path across rotation instead of the original descriptor
    pub reopen_on_rotate: bool,
    /// How often the tailer rechecks a file at end-of-file
    pub poll_interval: Duration,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            max_lines: 0,
            min_lines: 1,
            timeout: Duration::from_millis(1),
            start_at_end: false,
            reopen_on_rotate: false,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Static presentation settings for webhook payloads
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub username: String,
    pub prefix: String,
    pub color: String,
    /// Syntax tag for the fenced code block in plain-text mode
    pub syntax: String,
    /// Post as an attachment rather than plain text
    pub attach: bool,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            username: String::new(),
            prefix: ":warning:".to_string(),
            color: "#FF0000".to_string(),
            syntax: String::new(),
            attach: true,
        }
    }
}
