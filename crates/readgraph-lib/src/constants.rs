//! Constants shared across the library and the CLI

/// Version number
pub const VERSION: (u8, u8, u8) = (0, 1, 0);

/// Minimum number of shared buckets for a relaxed-mode edge
pub const DEFAULT_RELAXED_MIN_SHARED: usize = 1;

/// Prefix used in progress log messages
pub const LOG_PREFIX: &str = "[readgraph::partition]";

/// Timer label for the read loading stage
pub const STAGE_LOAD: &str = "loadreads";
/// Timer label for edge population
pub const STAGE_EDGES: &str = "buildgraph";
/// Timer label for component traversal
pub const STAGE_PARTITION: &str = "partition";

/// Is `value` inside `[min, max]`, where a missing bound is unbounded
#[inline]
pub fn within_bounds(value: u64, min: Option<u64>, max: Option<u64>) -> bool {
    min.is_none_or(|lo| value >= lo) && max.is_none_or(|hi| value <= hi)
}
