/// Error types for the log watcher
pub mod error;

/// Line and entry types
pub mod events;

/// Configuration loading and validation
pub mod config;

/// Begin/end/exclude pattern matching
pub mod filters;

/// Watch target resolution and file tailing
pub mod collectors;

/// Line aggregation into log entries
pub mod aggregator;

/// Webhook payloads and delivery
pub mod alerts;

/// Per-file task wiring
pub mod monitor;

// Re-export commonly used types
pub use config::Config;
pub use error::{ConfigError, DispatchError, SourceError};
pub use monitor::LogMonitor;
