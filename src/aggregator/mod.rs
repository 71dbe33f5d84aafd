/// Pure entry segmentation rules
pub mod segmenter;

/// Async driver that feeds a segmenter from a line channel and a timer
pub mod file_aggregator;

pub use file_aggregator::FileAggregator;
pub use segmenter::{Event, FlushReason, Segmenter, Step, Wait};
