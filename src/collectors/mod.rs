/// Watch target resolution from paths and globs
pub mod finder;

/// Line source that follows a growing file
pub mod tailer;

pub use finder::resolve_targets;
pub use tailer::FileTailer;
