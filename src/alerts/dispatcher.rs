use crate::alerts::payload::WebhookPayload;
use crate::alerts::webhook::WebhookSink;
use crate::config::Config;
use crate::events::LogEntry;
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Pause before the single retry of a refused stream
const REFUSED_STREAM_BACKOFF: Duration = Duration::from_millis(1);

/// Attempts allowed for one entry, including the first
const MAX_ATTEMPTS: u8 = 2;

/// What happened to a dispatched entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The webhook accepted the payload
    Delivered { attempts: u8 },
    /// An exclude pattern matched one of the lines
    Excluded,
    /// A begin pattern is configured and the first line does not match it
    MissingBegin,
    /// Every line is empty or whitespace
    Blank,
    /// Serialization or delivery failed; the entry is lost
    Dropped,
}

/// Turns completed entries into webhook posts
///
/// Cheap to clone; every dispatch runs on its own task so aggregators never
/// wait on the network.
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<Config>,
    sink: Arc<dyn WebhookSink>,
}

impl Dispatcher {
    pub fn new(config: Arc<Config>, sink: Arc<dyn WebhookSink>) -> Self {
        Self { config, sink }
    }

    /// Dispatch `entry` on a new task without waiting for the result
    pub fn spawn(&self, entry: LogEntry) -> JoinHandle<DispatchOutcome> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.dispatch(entry).await })
    }

    /// Screen, build and deliver one entry
    pub async fn dispatch(&self, entry: LogEntry) -> DispatchOutcome {
        if let Some(outcome) = self.screen(&entry) {
            debug!(
                "Discarding entry from {} ({:?}): {:?}",
                entry.file, outcome, entry.lines
            );
            return outcome;
        }

        let payload = WebhookPayload::build(&entry, &self.config.presentation);
        let body = match serde_json::to_string(&payload) {
            Ok(body) => body,
            Err(e) => {
                error!(
                    "Failed to serialize payload for {}: {} (lines: {:?})",
                    entry.file, e, entry.lines
                );
                return DispatchOutcome::Dropped;
            }
        };
        debug!("Payload prepared for {}: {}", entry.file, body);

        self.deliver(&entry, body).await
    }

    /// Apply the discard rules; `None` means the entry should be sent
    fn screen(&self, entry: &LogEntry) -> Option<DispatchOutcome> {
        let filters = &self.config.filters;

        if filters.is_excluded(entry.lines.as_slice()) {
            return Some(DispatchOutcome::Excluded);
        }
        // Entries flushed by max lines or timeout can start mid-trace
        if filters.has_begin() && !filters.matches_begin(entry.first_line()) {
            return Some(DispatchOutcome::MissingBegin);
        }
        if entry.is_blank() {
            return Some(DispatchOutcome::Blank);
        }
        None
    }

    /// Post the body, retrying once if the stream was refused
    async fn deliver(&self, entry: &LogEntry, body: String) -> DispatchOutcome {
        let url = &self.config.url;
        let mut attempt = 1;

        loop {
            match self.sink.post(url, body.clone()).await {
                Ok(()) => {
                    info!(
                        "Delivered entry of {} lines from {} (first seen {})",
                        entry.lines.len(),
                        entry.file,
                        entry.first_seen
                    );
                    return DispatchOutcome::Delivered { attempts: attempt };
                }
                Err(e) if e.is_refused_stream() && attempt < MAX_ATTEMPTS => {
                    debug!("Webhook {} refused stream for {}, retrying: {}", url, entry.file, e);
                    tokio::time::sleep(REFUSED_STREAM_BACKOFF).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        "Failed to post entry from {} to {} after {} attempt(s): {} (payload: {})",
                        entry.file, url, attempt, e, body
                    );
                    return DispatchOutcome::Dropped;
                }
            }
        }
    }
}
