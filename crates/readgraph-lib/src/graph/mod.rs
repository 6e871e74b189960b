//! Read graph construction and partitioning
//!
//! This module implements the partitioning pipeline:
//! 1. Load reads and build the canonical k-mer index
//! 2. Populate edges from k-mer buckets (strict or relaxed policy)
//! 3. Traverse connected components, with dedup and abundance filtering

pub mod config;
pub mod edges;
pub mod error;
pub mod index;
pub mod load;
pub mod partition;
pub mod read_graph;

/// Dense read identifier, assigned in load order
pub type NodeId = u32;

pub use config::PartitionConfiguration;
pub use edges::{Edge, EdgePolicy, EdgeStatistics};
pub use error::ReadGraphError;
pub use index::{BucketStatistics, KmerBucket, KmerIndex};
pub use load::{load_reads, LoadStatistics, ReadSet};
pub use partition::{Partition, PartitionOptions, PartitionStats, Partitions};
pub use read_graph::ReadGraph;
