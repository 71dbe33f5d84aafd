use super::segmenter::{Event, Flushed, Segmenter, Wait};
use crate::events::{LogEntry, LogLine};
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::Receiver;

/// Drives a [`Segmenter`] for one watched file
///
/// Pulls lines from the tailer's channel, arms the idle timer when the
/// segmenter asks for it and hands each completed [`LogEntry`] to `on_flush`.
/// `on_flush` must not block: in production it spawns a dispatch task.
pub struct FileAggregator<F> {
    file: Arc<str>,
    segmenter: Segmenter,
    lines: Receiver<LogLine>,
    buffer: Vec<LogLine>,
    on_flush: F,
}

impl<F> FileAggregator<F>
where
    F: FnMut(LogEntry),
{
    pub fn new(file: Arc<str>, segmenter: Segmenter, lines: Receiver<LogLine>, on_flush: F) -> Self {
        Self {
            file,
            segmenter,
            lines,
            buffer: Vec::new(),
            on_flush,
        }
    }

    /// Run until the line source closes
    ///
    /// Lines still buffered when the source closes are flushed as one last
    /// entry.
    pub async fn run(mut self) {
        debug!("Aggregator started for {}", self.file);
        let mut wait = Wait::Line;

        loop {
            let event = match wait {
                Wait::Line => match self.lines.recv().await {
                    Some(line) => Event::Line(line),
                    None => break,
                },
                Wait::LineOrTimeout => match self.next_line_or_timeout().await {
                    Some(event) => event,
                    None => break,
                },
            };

            if event == Event::TimerFired {
                debug!("Timer expired for {}, flushing {} lines", self.file, self.buffer.len());
            }

            let outcome = self.segmenter.advance(&mut self.buffer, event);
            for flushed in outcome.flushed {
                self.emit(flushed);
            }
            wait = outcome.next;
        }

        if let Some(flushed) = self.segmenter.finish(&mut self.buffer) {
            self.emit(flushed);
        }
        info!("Line source for {} closed, aggregator stopped", self.file);
    }

    /// Take a line that is already waiting, otherwise race the next line
    /// against the idle timer. `None` means the source closed.
    async fn next_line_or_timeout(&mut self) -> Option<Event> {
        match self.lines.try_recv() {
            Ok(line) => return Some(Event::Line(line)),
            Err(TryRecvError::Disconnected) => return None,
            Err(TryRecvError::Empty) => {}
        }

        let timeout = self.segmenter.policy().timeout;
        tokio::select! {
            biased;
            line = self.lines.recv() => line.map(Event::Line),
            _ = tokio::time::sleep(timeout) => Some(Event::TimerFired),
        }
    }

    fn emit(&mut self, flushed: Flushed) {
        debug!(
            "Flushing {} lines from {} ({:?})",
            flushed.lines.len(),
            self.file,
            flushed.reason
        );
        if let Some(entry) = LogEntry::from_lines(Arc::clone(&self.file), flushed.lines) {
            (self.on_flush)(entry);
        }
    }
}
