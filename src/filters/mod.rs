/// Compiled begin/end/exclude patterns
pub mod filter_set;

pub use filter_set::FilterSet;
