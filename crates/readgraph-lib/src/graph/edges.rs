//! Edge construction from k-mer buckets
//!
//! Edges come from the k-mer index rather than from comparing every read
//! against every other: each bucket with two or more reads contributes all
//! pairs of its reads. Total cost is the sum of squared bucket sizes.
//!
//! Buckets are visited in first-seen order and pairs in posting order, so
//! edges (and therefore adjacency lists) are inserted in the same order on
//! every run. With more than one thread, pair lists are generated in
//! parallel and merged in bucket order, which gives the same result.

use crate::graph::error::ReadGraphError;
use crate::graph::index::KmerBucket;
use crate::graph::read_graph::ReadGraph;
use crate::graph::NodeId;
use crate::hasher::{map_with_capacity, DetHashMap};
use rayon::prelude::*;
use tracing::{debug, info};

/// Rule deciding when two reads are linked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgePolicy {
    /// Link reads sharing at least one interesting k-mer; the edge weight
    /// is the number of shared interesting k-mers
    Strict,
    /// Link reads sharing at least `min_shared` annotated k-mers, interesting
    /// or not; the edge only records presence (weight 1)
    Relaxed {
        /// Shared buckets required for an edge
        min_shared: usize,
    },
}

impl EdgePolicy {
    /// Reads of a bucket considered by this policy
    #[inline]
    pub fn postings<'a>(&self, bucket: &'a KmerBucket) -> &'a [NodeId] {
        match self {
            EdgePolicy::Strict => bucket.novel(),
            EdgePolicy::Relaxed { .. } => bucket.carriers(),
        }
    }

    fn threshold(&self) -> u32 {
        match self {
            EdgePolicy::Strict => 1,
            EdgePolicy::Relaxed { min_shared } => (*min_shared).max(1) as u32,
        }
    }

    /// Short name for log messages
    pub fn name(&self) -> &'static str {
        match self {
            EdgePolicy::Strict => "strict",
            EdgePolicy::Relaxed { .. } => "relaxed",
        }
    }
}

/// An undirected edge; `a < b`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Lower node id
    pub a: NodeId,
    /// Higher node id
    pub b: NodeId,
    /// Shared interesting k-mers (strict) or 1 (relaxed)
    pub weight: u32,
}

/// Counters collected while populating edges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeStatistics {
    /// Buckets that produced at least one pair
    pub num_linking_buckets: usize,
    /// Pairs visited, counting repeats across buckets
    pub num_pairs_visited: u64,
    /// Distinct read pairs seen
    pub num_distinct_pairs: usize,
    /// Edges created
    pub num_edges: usize,
}

/// All unordered pairs of a bucket in posting order
fn bucket_pairs(reads: &[NodeId]) -> Vec<(NodeId, NodeId)> {
    let n = reads.len();
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for (i, &a) in reads.iter().enumerate() {
        for &b in &reads[i + 1..] {
            pairs.push((a, b));
        }
    }
    pairs
}

/// Accumulates pair counts and materializes edges once a pair reaches the
/// policy threshold
struct EdgeAccumulator {
    policy: EdgePolicy,
    threshold: u32,
    /// Per pair: times seen, and edge id once materialized
    counts: DetHashMap<(NodeId, NodeId), (u32, Option<u32>)>,
    adjacency: Vec<Vec<(NodeId, u32)>>,
    edges: Vec<Edge>,
    pairs_visited: u64,
}

impl EdgeAccumulator {
    fn new(policy: EdgePolicy, num_reads: usize, expected_pairs: usize) -> Self {
        Self {
            policy,
            threshold: policy.threshold(),
            counts: map_with_capacity(expected_pairs),
            adjacency: vec![Vec::new(); num_reads],
            edges: Vec::new(),
            pairs_visited: 0,
        }
    }

    fn add_pair(&mut self, x: NodeId, y: NodeId) {
        if x == y {
            return;
        }
        self.pairs_visited += 1;
        let key = if x < y { (x, y) } else { (y, x) };
        let entry = self.counts.entry(key).or_insert((0, None));
        entry.0 += 1;
        match entry.1 {
            Some(edge) => {
                if self.policy == EdgePolicy::Strict {
                    self.edges[edge as usize].weight = entry.0;
                }
            }
            None if entry.0 >= self.threshold => {
                let edge = self.edges.len() as u32;
                let weight = match self.policy {
                    EdgePolicy::Strict => entry.0,
                    EdgePolicy::Relaxed { .. } => 1,
                };
                entry.1 = Some(edge);
                self.edges.push(Edge { a: key.0, b: key.1, weight });
                self.adjacency[key.0 as usize].push((key.1, edge));
                self.adjacency[key.1 as usize].push((key.0, edge));
            }
            None => {}
        }
    }
}

impl ReadGraph {
    /// Populate the edge set under `policy`
    ///
    /// `num_threads` sizes the rayon pool used to generate bucket pairs
    /// (0 = all cores, 1 = serial, no pool).
    ///
    /// # Errors
    /// Returns [`ReadGraphError::EdgesAlreadyPopulated`] on a second call
    pub fn populate_edges(
        &mut self,
        policy: EdgePolicy,
        num_threads: usize,
    ) -> Result<EdgeStatistics, ReadGraphError> {
        if self.policy.is_some() {
            return Err(ReadGraphError::EdgesAlreadyPopulated);
        }

        let linking: Vec<&[NodeId]> = self
            .index
            .buckets()
            .iter()
            .map(|bucket| policy.postings(bucket))
            .filter(|reads| reads.len() >= 2)
            .collect();
        let expected_pairs: usize = linking.iter().map(|r| r.len() * (r.len() - 1) / 2).sum();
        debug!(
            "{} linking buckets, {} candidate pairs ({} mode)",
            linking.len(),
            expected_pairs,
            policy.name()
        );

        let mut acc = EdgeAccumulator::new(policy, self.reads.len(), expected_pairs);
        if num_threads == 1 {
            for reads in &linking {
                for (a, b) in bucket_pairs(reads) {
                    acc.add_pair(a, b);
                }
            }
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build()
                .map_err(|e| ReadGraphError::ThreadPool(e.to_string()))?;
            let pair_lists: Vec<Vec<(NodeId, NodeId)>> =
                pool.install(|| linking.par_iter().map(|reads| bucket_pairs(reads)).collect());
            for pairs in pair_lists {
                for (a, b) in pairs {
                    acc.add_pair(a, b);
                }
            }
        }

        let stats = EdgeStatistics {
            num_linking_buckets: linking.len(),
            num_pairs_visited: acc.pairs_visited,
            num_distinct_pairs: acc.counts.len(),
            num_edges: acc.edges.len(),
        };

        self.edge_lookup = map_with_capacity(acc.edges.len());
        for (id, edge) in acc.edges.iter().enumerate() {
            self.edge_lookup.insert((edge.a, edge.b), id as u32);
        }
        self.adjacency = acc.adjacency;
        self.edges = acc.edges;
        self.policy = Some(policy);

        info!(
            "  {} edges among {} reads ({} mode)",
            stats.num_edges,
            self.reads.len(),
            policy.name()
        );
        Ok(stats)
    }
}
