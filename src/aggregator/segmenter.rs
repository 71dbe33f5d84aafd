//! Entry segmentation state machine
//!
//! The [`Segmenter`] decides, for one watched file, where a log entry ends and
//! the next begins. It is free of I/O and timers: the caller feeds it
//! [`Event`]s and performs the [`Wait`] it asks for, which keeps every
//! boundary rule testable without real files or clocks.
//!
//! Rules are evaluated in priority order after every event:
//!
//! 1. the last buffered line matches the end pattern: flush everything
//! 2. the last buffered line matches the begin pattern and is not alone:
//!    flush everything before it, keep it as the start of the next entry
//! 3. `max_lines` reached: flush everything
//! 4. fewer than `min_lines` buffered: wait for a line, no timer
//!
//! Otherwise the caller drains ready lines and then races the next line
//! against the idle timeout.

use crate::config::AggregationPolicy;
use crate::events::LogLine;
use crate::filters::FilterSet;

/// Input to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A new line was appended to the file
    Line(LogLine),
    /// The idle timer expired before another line arrived
    TimerFired,
}

/// Why a buffer was flushed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    EndMatched,
    BeginMatched,
    MaxLines,
    Timeout,
    SourceClosed,
}

/// Single decision for the current buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Flush the whole buffer
    Flush(FlushReason),
    /// Flush all but the last line, which seeds the next entry
    SplitBeforeLast,
    /// Below the minimum: block for the next line
    AwaitLine,
    /// Drain ready lines, then race the next line against the timeout
    AwaitLineOrTimeout,
}

/// How the caller should wait for the next event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    Line,
    LineOrTimeout,
}

/// Lines flushed by one call to [`Segmenter::advance`]
#[derive(Debug, Clone, PartialEq)]
pub struct Flushed {
    pub reason: FlushReason,
    pub lines: Vec<LogLine>,
}

/// Result of feeding one event
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Entries completed by this event, in flush order
    pub flushed: Vec<Flushed>,
    /// What to wait for next
    pub next: Wait,
}

#[derive(Debug, Clone)]
pub struct Segmenter {
    filters: FilterSet,
    policy: AggregationPolicy,
}

impl Segmenter {
    pub fn new(filters: FilterSet, policy: AggregationPolicy) -> Self {
        Self { filters, policy }
    }

    pub fn policy(&self) -> &AggregationPolicy {
        &self.policy
    }

    /// Decide what to do with `buffer` without modifying it
    ///
    /// An empty buffer always waits for a line, so nothing empty is ever
    /// flushed and an end pattern matching the empty string cannot loop.
    pub fn evaluate(&self, buffer: &[LogLine]) -> Step {
        let Some(last) = buffer.last() else {
            return Step::AwaitLine;
        };

        if self.filters.matches_end(&last.text) {
            return Step::Flush(FlushReason::EndMatched);
        }
        if buffer.len() > 1 && self.filters.matches_begin(&last.text) {
            return Step::SplitBeforeLast;
        }
        if self.policy.max_lines > 0 && buffer.len() >= self.policy.max_lines {
            return Step::Flush(FlushReason::MaxLines);
        }
        if buffer.len() < self.policy.min_lines {
            return Step::AwaitLine;
        }
        Step::AwaitLineOrTimeout
    }

    /// Apply one event to `buffer` and run the rules until a wait is needed
    pub fn advance(&self, buffer: &mut Vec<LogLine>, event: Event) -> Outcome {
        let mut flushed = Vec::new();

        match event {
            Event::Line(line) => buffer.push(line),
            Event::TimerFired => {
                if let Some(f) = take_all(buffer, FlushReason::Timeout) {
                    flushed.push(f);
                }
            }
        }

        loop {
            match self.evaluate(buffer) {
                Step::Flush(reason) => {
                    if let Some(f) = take_all(buffer, reason) {
                        flushed.push(f);
                    }
                }
                Step::SplitBeforeLast => {
                    // evaluate only splits buffers holding at least two lines
                    let next_first = buffer.split_off(buffer.len() - 1);
                    let lines = std::mem::replace(buffer, next_first);
                    flushed.push(Flushed {
                        reason: FlushReason::BeginMatched,
                        lines,
                    });
                }
                Step::AwaitLine => {
                    return Outcome {
                        flushed,
                        next: Wait::Line,
                    }
                }
                Step::AwaitLineOrTimeout => {
                    return Outcome {
                        flushed,
                        next: Wait::LineOrTimeout,
                    }
                }
            }
        }
    }

    /// Flush whatever is left when the line source goes away
    pub fn finish(&self, buffer: &mut Vec<LogLine>) -> Option<Flushed> {
        take_all(buffer, FlushReason::SourceClosed)
    }
}

fn take_all(buffer: &mut Vec<LogLine>, reason: FlushReason) -> Option<Flushed> {
    if buffer.is_empty() {
        return None;
    }
    Some(Flushed {
        reason,
        lines: std::mem::take(buffer),
    })
}
