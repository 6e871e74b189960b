//! Run configuration for read graph partitioning
//!
//! Collects every parameter of a load -> populate edges -> partition run.

use crate::constants::DEFAULT_RELAXED_MIN_SHARED;
use crate::graph::edges::EdgePolicy;
use crate::graph::partition::PartitionOptions;

/// Configuration parameters for a partitioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionConfiguration {
    /// Link reads only through shared interesting k-mers
    pub strict: bool,

    /// Minimum shared buckets for an edge in relaxed mode
    pub relaxed_min_shared: usize,

    /// Lower bound on k-mer case abundance at load time, and on component
    /// abundance when filtering
    pub min_abund: Option<u64>,

    /// Upper bound on k-mer case abundance at load time, and on component
    /// abundance when filtering
    pub max_abund: Option<u64>,

    /// Collapse reads with identical sequences
    pub dedup: bool,

    /// Drop components whose abundance falls outside the bounds
    pub abund_filter: bool,

    /// Number of threads for edge generation (0 = all available cores,
    /// 1 = serial)
    pub num_threads: usize,
}

impl Default for PartitionConfiguration {
    fn default() -> Self {
        Self {
            strict: false,
            relaxed_min_shared: DEFAULT_RELAXED_MIN_SHARED,
            min_abund: None,
            max_abund: None,
            dedup: true,
            abund_filter: true,
            num_threads: 1,
        }
    }
}

impl PartitionConfiguration {
    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.relaxed_min_shared == 0 {
            return Err("relaxed_min_shared must be at least 1".to_string());
        }
        if let (Some(lo), Some(hi)) = (self.min_abund, self.max_abund) {
            if lo > hi {
                return Err(format!(
                    "min_abund must not exceed max_abund, got min_abund={lo}, max_abund={hi}"
                ));
            }
        }
        Ok(())
    }

    /// Edge policy selected by this configuration
    pub fn edge_policy(&self) -> EdgePolicy {
        if self.strict {
            EdgePolicy::Strict
        } else {
            EdgePolicy::Relaxed {
                min_shared: self.relaxed_min_shared,
            }
        }
    }

    /// Traversal options selected by this configuration
    pub fn partition_options(&self) -> PartitionOptions {
        PartitionOptions {
            dedup: self.dedup,
            min_abund: self.min_abund,
            max_abund: self.max_abund,
            abund_filter: self.abund_filter,
        }
    }

    /// Log configuration parameters via tracing
    pub fn print(&self) {
        tracing::info!("Partition Configuration:");
        tracing::info!("  mode = {}", if self.strict { "strict" } else { "relaxed" });
        if !self.strict {
            tracing::debug!("  relaxed_min_shared = {}", self.relaxed_min_shared);
        }
        tracing::info!("  min_abund = {:?}", self.min_abund);
        tracing::info!("  max_abund = {:?}", self.max_abund);
        tracing::info!("  dedup = {}", self.dedup);
        tracing::debug!("  abund_filter = {}", self.abund_filter);
        if self.num_threads == 0 {
            tracing::debug!("  num_threads = all available cores");
        } else {
            tracing::debug!("  num_threads = {}", self.num_threads);
        }
    }
}
