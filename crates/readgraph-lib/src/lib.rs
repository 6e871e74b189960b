// readgraph: k-mer-linked read partitioning
//
// Groups sequencing reads into connected components of a graph whose
// edges are shared novel k-mers, ahead of local assembly of variant loci.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod augfastx;
pub mod constants;
pub mod encoding;
pub mod export;
pub mod graph;
pub mod hasher;
pub mod kmer;
pub mod pipeline;
pub mod record;
pub mod timer;

// Re-export common types at crate root
pub use export::{GmlExporter, GraphExport};
pub use graph::{
    EdgePolicy, Partition, PartitionConfiguration, PartitionOptions, Partitions, ReadGraph,
    ReadGraphError,
};
pub use kmer::{canonicalize, reverse_complement, CanonicalKmer};
pub use pipeline::{partition_reads, PartitionPipeline, PartitionSummary};
pub use record::{AugmentedRecord, KmerAnnotation};

/// Version information
pub fn version() -> (u8, u8, u8) {
    constants::VERSION
}
