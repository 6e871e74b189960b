//! Read loading and k-mer index construction
//!
//! Single pass over a stream of decoded augmented records. Every read
//! becomes a node; every annotation within the abundance bounds is
//! canonicalized and registered in the [`KmerIndex`].

use crate::constants::within_bounds;
use crate::encoding::validate_read_sequence;
use crate::graph::error::ReadGraphError;
use crate::graph::index::KmerIndex;
use crate::graph::NodeId;
use crate::hasher::{new_map, DetHashMap};
use crate::kmer::canonicalize;
use crate::record::AugmentedRecord;
use tracing::warn;

/// Loaded reads, addressed by dense node id in load order
#[derive(Debug, Clone, Default)]
pub struct ReadSet {
    reads: Vec<AugmentedRecord>,
    ids: DetHashMap<String, NodeId>,
}

impl ReadSet {
    /// Number of reads
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    /// True if no read was loaded
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// Read at node `id`
    ///
    /// # Panics
    /// Panics if `id` is out of range
    pub fn get(&self, id: NodeId) -> &AugmentedRecord {
        &self.reads[id as usize]
    }

    /// Node id of a read name
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.ids.get(name).copied()
    }

    /// All reads in load order
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &AugmentedRecord> {
        self.reads.iter()
    }

    fn push(&mut self, record: AugmentedRecord) -> Result<NodeId, ReadGraphError> {
        let node = self.reads.len() as NodeId;
        if self.ids.contains_key(&record.id) {
            return Err(ReadGraphError::DuplicateReadId(record.id));
        }
        self.ids.insert(record.id.clone(), node);
        self.reads.push(record);
        Ok(node)
    }
}

/// Counters collected while loading
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStatistics {
    /// Reads loaded
    pub num_reads: usize,
    /// Annotations seen across all reads
    pub num_annotations: usize,
    /// Annotations registered in the index
    pub num_indexed: usize,
    /// Indexed annotations that were interesting
    pub num_interesting: usize,
    /// Annotations skipped for falling outside the abundance bounds
    pub num_out_of_range: usize,
    /// Annotations dropped for a malformed k-mer
    pub num_malformed: usize,
}

/// Load reads and build the k-mer index in one pass
///
/// Annotations whose case abundance lies outside `[min_abund, max_abund]`
/// are not indexed. Malformed annotation k-mers are dropped with a
/// warning; a malformed read sequence fails the whole load.
///
/// # Errors
/// - [`ReadGraphError::Source`] if the stream yields an error
/// - [`ReadGraphError::InvalidAlphabet`] if a read sequence is malformed
/// - [`ReadGraphError::DuplicateReadId`] if two reads share a name
/// - [`ReadGraphError::EmptyReadSet`] if the stream is empty
pub fn load_reads<I, E>(
    stream: I,
    min_abund: Option<u64>,
    max_abund: Option<u64>,
) -> Result<(ReadSet, KmerIndex, LoadStatistics), ReadGraphError>
where
    I: IntoIterator<Item = Result<AugmentedRecord, E>>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut reads = ReadSet {
        reads: Vec::new(),
        ids: new_map(),
    };
    let mut index = KmerIndex::new();
    let mut stats = LoadStatistics::default();

    for (i, item) in stream.into_iter().enumerate() {
        let record = item.map_err(|e| ReadGraphError::Source {
            index: i,
            source: e.into(),
        })?;

        validate_read_sequence(record.sequence.as_bytes()).map_err(|source| {
            ReadGraphError::InvalidAlphabet {
                read_id: record.id.clone(),
                source,
            }
        })?;

        let mut registrations = Vec::with_capacity(record.annotations.len());
        for annot in &record.annotations {
            stats.num_annotations += 1;
            if !within_bounds(annot.case_abund, min_abund, max_abund) {
                stats.num_out_of_range += 1;
                continue;
            }
            match canonicalize(annot.sequence.as_bytes()) {
                Ok(kmer) => registrations.push((kmer, annot.is_interesting())),
                Err(e) => {
                    warn!(
                        "Dropping annotation {:?} of read {}: {}",
                        annot.sequence, record.id, e
                    );
                    stats.num_malformed += 1;
                }
            }
        }

        let node = reads.push(record)?;
        for (kmer, interesting) in registrations {
            stats.num_indexed += 1;
            if interesting {
                stats.num_interesting += 1;
            }
            index.register(kmer, node, interesting);
        }
    }

    if reads.is_empty() {
        return Err(ReadGraphError::EmptyReadSet);
    }
    stats.num_reads = reads.len();
    Ok((reads, index, stats))
}
