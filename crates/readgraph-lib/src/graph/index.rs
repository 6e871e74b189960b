//! Inverted k-mer index and bucket statistics
//!
//! Maps each canonical k-mer to the reads that carry it. Buckets are kept
//! in the order their k-mer was first seen, so walking the index is
//! deterministic for a given input order.
//!
//! Each bucket holds two posting lists:
//! - `novel`: reads for which the k-mer is interesting (strict policy)
//! - `carriers`: every read annotated with the k-mer (relaxed policy)
//!
//! Both lists only contain annotations that passed the load-time abundance
//! bounds.

use crate::graph::NodeId;
use crate::hasher::{new_map, DetHashMap};
use crate::kmer::CanonicalKmer;
use tracing::info;

/// One canonical k-mer and the reads carrying it
#[derive(Debug, Clone)]
pub struct KmerBucket {
    kmer: CanonicalKmer,
    carriers: Vec<NodeId>,
    novel: Vec<NodeId>,
}

impl KmerBucket {
    fn new(kmer: CanonicalKmer) -> Self {
        Self {
            kmer,
            carriers: Vec::new(),
            novel: Vec::new(),
        }
    }

    /// Canonical k-mer of this bucket
    pub fn kmer(&self) -> &CanonicalKmer {
        &self.kmer
    }

    /// Reads annotated with this k-mer, in load order
    pub fn carriers(&self) -> &[NodeId] {
        &self.carriers
    }

    /// Reads for which this k-mer is interesting, in load order
    pub fn novel(&self) -> &[NodeId] {
        &self.novel
    }
}

/// Push `node` unless it was the last one pushed.
///
/// Reads are registered one at a time, so this is enough to keep each
/// posting list free of repeats.
#[inline]
fn push_once(list: &mut Vec<NodeId>, node: NodeId) {
    if list.last() != Some(&node) {
        list.push(node);
    }
}

/// Canonical k-mer -> reads inverted index
#[derive(Debug, Clone)]
pub struct KmerIndex {
    lookup: DetHashMap<CanonicalKmer, usize>,
    buckets: Vec<KmerBucket>,
}

impl Default for KmerIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl KmerIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            lookup: new_map(),
            buckets: Vec::new(),
        }
    }

    /// Record that `node` carries `kmer`
    ///
    /// `interesting` also places the read in the bucket's strict posting
    /// list.
    pub fn register(&mut self, kmer: CanonicalKmer, node: NodeId, interesting: bool) {
        let slot = match self.lookup.get(&kmer) {
            Some(&slot) => slot,
            None => {
                let slot = self.buckets.len();
                self.lookup.insert(kmer.clone(), slot);
                self.buckets.push(KmerBucket::new(kmer));
                slot
            }
        };
        let bucket = &mut self.buckets[slot];
        push_once(&mut bucket.carriers, node);
        if interesting {
            push_once(&mut bucket.novel, node);
        }
    }

    /// Bucket for a canonical k-mer
    pub fn get(&self, kmer: &str) -> Option<&KmerBucket> {
        self.lookup.get(kmer).map(|&slot| &self.buckets[slot])
    }

    /// Reads for which `kmer` is interesting (empty if unknown)
    pub fn interesting_reads(&self, kmer: &str) -> &[NodeId] {
        self.get(kmer).map_or(&[], |b| b.novel())
    }

    /// All buckets in first-seen order
    pub fn buckets(&self) -> &[KmerBucket] {
        &self.buckets
    }

    /// Number of distinct canonical k-mers
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// True if no k-mer was registered
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Summarize bucket sizes for one posting list
    pub fn statistics(&self, novel: bool) -> BucketStatistics {
        let mut stats = BucketStatistics::new();
        for bucket in &self.buckets {
            let list = if novel { bucket.novel() } else { bucket.carriers() };
            stats.add_bucket(list.len());
        }
        stats
    }
}

/// Statistics about bucket sizes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketStatistics {
    /// Buckets with at least one read
    pub num_buckets: u64,

    /// Buckets holding exactly one read (cannot form edges)
    pub num_singleton_buckets: u64,

    /// Buckets holding two or more reads
    pub num_linking_buckets: u64,

    /// Largest bucket
    pub max_bucket_size: usize,

    /// Total read registrations
    pub num_postings: u64,

    /// Read pairs the edge builder will visit
    pub num_candidate_pairs: u64,
}

impl BucketStatistics {
    /// Create a new statistics tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a bucket of the given size
    pub fn add_bucket(&mut self, size: usize) {
        if size == 0 {
            return;
        }
        self.num_buckets += 1;
        self.num_postings += size as u64;
        self.max_bucket_size = self.max_bucket_size.max(size);
        if size == 1 {
            self.num_singleton_buckets += 1;
        } else {
            self.num_linking_buckets += 1;
            let n = size as u64;
            self.num_candidate_pairs += n * (n - 1) / 2;
        }
    }

    /// Log statistics summary via tracing
    pub fn print_summary(&self) {
        let pct = |x: u64| {
            if self.num_buckets == 0 {
                0.0
            } else {
                (x as f64 * 100.0) / self.num_buckets as f64
            }
        };
        info!("Bucket Statistics:");
        info!("  Total buckets: {}", self.num_buckets);
        info!("  Total postings: {}", self.num_postings);
        info!(
            "  Singleton buckets: {} ({:.2}%)",
            self.num_singleton_buckets,
            pct(self.num_singleton_buckets)
        );
        info!(
            "  Linking buckets (>=2): {} ({:.2}%)",
            self.num_linking_buckets,
            pct(self.num_linking_buckets)
        );
        info!("  Max bucket size: {}", self.max_bucket_size);
        info!("  Candidate read pairs: {}", self.num_candidate_pairs);
    }
}
