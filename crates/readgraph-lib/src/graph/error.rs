//! Error type for graph construction and traversal

use crate::encoding::EncodingError;
use thiserror::Error;

/// Failures that terminate a partitioning run
#[derive(Error, Debug)]
pub enum ReadGraphError {
    /// A read sequence contains characters outside the nucleotide alphabet
    #[error("Read {read_id}: {source}")]
    InvalidAlphabet {
        /// Name of the malformed read
        read_id: String,
        /// Offending base
        #[source]
        source: EncodingError,
    },

    /// Two records share the same name
    #[error("Duplicate read id: {0}")]
    DuplicateReadId(String),

    /// The input stream produced no reads
    #[error("No reads loaded: the input stream was empty")]
    EmptyReadSet,

    /// Partitions were requested from a graph that was already traversed
    #[error("Read graph already traversed; call reset_traversal() before partitioning again")]
    GraphAlreadyConsumed,

    /// Edges were populated twice on the same graph
    #[error("Read graph edges already populated")]
    EdgesAlreadyPopulated,

    /// The upstream record source reported an error
    #[error("Failed to read record {index}")]
    Source {
        /// Zero-based index of the failing record in the stream
        index: usize,
        /// Underlying parser error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Thread pool setup failed
    #[error("Failed to create thread pool: {0}")]
    ThreadPool(String),
}
