//! Wiring of tailers, aggregators and the dispatcher
//!
//! Each watched file gets two tasks: a [`FileTailer`] producing lines and a
//! [`FileAggregator`] turning them into entries. Every flushed entry is
//! dispatched on its own task, so a slow webhook never stalls line
//! collection.

use crate::aggregator::{FileAggregator, Segmenter};
use crate::alerts::{Dispatcher, WebhookSink};
use crate::collectors::{resolve_targets, FileTailer};
use crate::config::Config;
use log::{debug, error, info};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Lines buffered between a tailer and its aggregator
const LINE_CHANNEL_CAPACITY: usize = 1024;

pub struct LogMonitor {
    config: Arc<Config>,
    dispatcher: Dispatcher,
    handles: Vec<JoinHandle<()>>,
}

impl LogMonitor {
    pub fn new(config: Arc<Config>, sink: Arc<dyn WebhookSink>) -> Self {
        let dispatcher = Dispatcher::new(Arc::clone(&config), sink);
        Self {
            config,
            dispatcher,
            handles: Vec::new(),
        }
    }

    /// Resolve the configured targets and start watching each of them
    ///
    /// Returns the number of files being watched. Must be called from within
    /// a tokio runtime.
    pub fn start(&mut self) -> usize {
        let filters = &self.config.filters;
        debug!(
            "Entry boundaries: begin pattern {}, end pattern {}",
            if filters.has_begin() { "set" } else { "unset" },
            if filters.has_end() { "set" } else { "unset" }
        );

        let targets = resolve_targets(&self.config.files, &self.config.globs);
        let count = targets.len();
        for path in targets {
            self.watch(path);
        }
        info!("Watching {} file(s)", count);
        count
    }

    /// Start the tailer and aggregator tasks for one file
    pub fn watch(&mut self, path: PathBuf) {
        let file: Arc<str> = Arc::from(path.display().to_string());
        info!("Starting watch on {}", file);

        let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);

        let tailer = FileTailer::new(path, &self.config.policy, tx);
        let tailed = Arc::clone(&file);
        self.handles.push(tokio::spawn(async move {
            if let Err(e) = tailer.run().await {
                error!("Error tailing {}, watch abandoned: {}", tailed, e);
            }
        }));

        let segmenter = Segmenter::new(self.config.filters.clone(), self.config.policy.clone());
        let dispatcher = self.dispatcher.clone();
        let aggregator = FileAggregator::new(file, segmenter, rx, move |entry| {
            dispatcher.spawn(entry);
        });
        self.handles.push(tokio::spawn(aggregator.run()));
    }

    /// Abort every watch; in-flight dispatches are not waited for
    pub fn stop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        info!("Stopping {} active task(s)", self.active_tasks());
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("All watches stopped");
    }

    /// Tailer and aggregator tasks that have not finished
    pub fn active_tasks(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }
}

impl Drop for LogMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
