//! Connected-component extraction
//!
//! Breadth-first traversal over the read graph. Seeds are taken in load
//! order and neighbors in edge insertion order, so the sequence of
//! partitions is fully determined by the input order and parameters.
//!
//! With deduplication enabled, reads with byte-identical sequences are
//! collapsed onto the first such read (the representative). Only
//! representatives take part in the traversal and in the abundance sum;
//! the collapsed reads are added back to the partition's member list.

use crate::constants::within_bounds;
use crate::graph::error::ReadGraphError;
use crate::graph::read_graph::ReadGraph;
use crate::graph::NodeId;
use crate::hasher::{map_with_capacity, new_map, DetHashMap};
use crate::kmer::{canonicalize, CanonicalKmer};
use crate::record::AugmentedRecord;
use std::collections::VecDeque;
use std::iter::FusedIterator;
use tracing::debug;

/// Traversal and filtering options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionOptions {
    /// Collapse reads with identical sequences
    pub dedup: bool,
    /// Minimum component abundance (when filtering)
    pub min_abund: Option<u64>,
    /// Maximum component abundance (when filtering)
    pub max_abund: Option<u64>,
    /// Drop components whose abundance falls outside the bounds
    pub abund_filter: bool,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            dedup: true,
            min_abund: None,
            max_abund: None,
            abund_filter: false,
        }
    }
}

/// Running counters of a traversal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionStats {
    /// Components yielded
    pub num_partitions: usize,
    /// Reads in yielded components
    pub num_reads_yielded: usize,
    /// Components dropped by the abundance filter
    pub num_filtered: usize,
    /// Reads in dropped components
    pub num_reads_filtered: usize,
    /// Reads collapsed onto a representative
    pub num_collapsed: usize,
}

/// One connected component of the read graph
#[derive(Debug, Clone)]
pub struct Partition<'g> {
    graph: &'g ReadGraph,
    number: usize,
    members: Vec<NodeId>,
    abundance: u64,
}

impl<'g> Partition<'g> {
    /// 1-based position in the sequence of yielded partitions
    pub fn number(&self) -> usize {
        self.number
    }

    /// Member node ids, in load order
    pub fn node_ids(&self) -> &[NodeId] {
        &self.members
    }

    /// Member reads, in load order
    pub fn reads(&self) -> impl ExactSizeIterator<Item = &'g AugmentedRecord> + '_ {
        let graph = self.graph;
        self.members.iter().map(move |&node| graph.read(node))
    }

    /// Member read names, in load order
    pub fn read_ids(&self) -> Vec<&'g str> {
        self.reads().map(|r| r.id.as_str()).collect()
    }

    /// Number of member reads, duplicates included
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Never true for a yielded partition
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Summed case abundance of the component's distinct interesting k-mers
    pub fn abundance(&self) -> u64 {
        self.abundance
    }
}

/// Representative of every node, and the reads collapsed onto each
/// representative
struct DedupMap {
    rep: Vec<NodeId>,
    collapsed: DetHashMap<NodeId, Vec<NodeId>>,
}

impl DedupMap {
    fn identity(num_reads: usize) -> Self {
        Self {
            rep: (0..num_reads as NodeId).collect(),
            collapsed: new_map(),
        }
    }

    fn by_sequence(graph: &ReadGraph) -> Self {
        let mut first: DetHashMap<&str, NodeId> = map_with_capacity(graph.num_reads());
        let mut map = Self::identity(graph.num_reads());
        for (node, read) in graph.reads().enumerate() {
            let node = node as NodeId;
            let rep = *first.entry(read.sequence.as_str()).or_insert(node);
            if rep != node {
                map.rep[node as usize] = rep;
                map.collapsed.entry(rep).or_default().push(node);
            }
        }
        map
    }

    #[inline]
    fn is_rep(&self, node: NodeId) -> bool {
        self.rep[node as usize] == node
    }

    fn group(&self, rep: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(rep).chain(self.collapsed.get(&rep).into_iter().flatten().copied())
    }

    fn num_collapsed(&self) -> usize {
        self.collapsed.values().map(Vec::len).sum()
    }
}

/// Lazy, single-pass sequence of partitions
///
/// Created by [`ReadGraph::partitions`]. Fused: once exhausted it keeps
/// returning `None`.
pub struct Partitions<'g> {
    graph: &'g ReadGraph,
    opts: PartitionOptions,
    dedup: DedupMap,
    visited: Vec<bool>,
    cursor: usize,
    queue: VecDeque<NodeId>,
    stats: PartitionStats,
}

impl<'g> Partitions<'g> {
    fn new(graph: &'g ReadGraph, opts: PartitionOptions) -> Self {
        let dedup = if opts.dedup {
            DedupMap::by_sequence(graph)
        } else {
            DedupMap::identity(graph.num_reads())
        };
        let stats = PartitionStats {
            num_collapsed: dedup.num_collapsed(),
            ..PartitionStats::default()
        };
        if stats.num_collapsed > 0 {
            debug!("Collapsed {} duplicate reads", stats.num_collapsed);
        }
        Self {
            graph,
            opts,
            dedup,
            visited: vec![false; graph.num_reads()],
            cursor: 0,
            queue: VecDeque::new(),
            stats,
        }
    }

    /// Counters so far; final once the iterator is exhausted
    pub fn stats(&self) -> &PartitionStats {
        &self.stats
    }

    /// Next unvisited representative in load order
    fn next_seed(&mut self) -> Option<NodeId> {
        while self.cursor < self.visited.len() {
            let node = self.cursor as NodeId;
            self.cursor += 1;
            if !self.visited[node as usize] && self.dedup.is_rep(node) {
                return Some(node);
            }
        }
        None
    }

    /// Representatives reachable from `seed`, in visit order
    fn component(&mut self, seed: NodeId) -> Vec<NodeId> {
        let mut reps = Vec::new();
        self.visited[seed as usize] = true;
        self.queue.push_back(seed);
        while let Some(node) = self.queue.pop_front() {
            reps.push(node);
            for member in self.dedup.group(node) {
                for (neighbor, _) in self.graph.neighbors(member) {
                    let rep = self.dedup.rep[neighbor as usize];
                    if !self.visited[rep as usize] {
                        self.visited[rep as usize] = true;
                        self.queue.push_back(rep);
                    }
                }
            }
        }
        reps
    }

    /// Sum of case abundance over distinct interesting k-mers of `reps`
    ///
    /// A k-mer carried by several reads counts once, at its highest case
    /// abundance.
    fn abundance(&self, reps: &[NodeId]) -> u64 {
        let mut best: DetHashMap<CanonicalKmer, u64> = new_map();
        for &node in reps {
            for annot in self.graph.read(node).interesting() {
                if let Ok(kmer) = canonicalize(annot.sequence.as_bytes()) {
                    let slot = best.entry(kmer).or_insert(0);
                    *slot = (*slot).max(annot.case_abund);
                }
            }
        }
        best.values().copied().fold(0u64, u64::saturating_add)
    }
}

impl<'g> Iterator for Partitions<'g> {
    type Item = Partition<'g>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(seed) = self.next_seed() {
            let reps = self.component(seed);
            let abundance = self.abundance(&reps);

            let mut members: Vec<NodeId> = reps
                .iter()
                .flat_map(|&rep| self.dedup.group(rep))
                .collect();
            members.sort_unstable();

            if self.opts.abund_filter
                && !within_bounds(abundance, self.opts.min_abund, self.opts.max_abund)
            {
                self.stats.num_filtered += 1;
                self.stats.num_reads_filtered += members.len();
                debug!(
                    "Component seeded at {} dropped: abundance {} outside [{:?}, {:?}], 0 reads written",
                    self.graph.read(seed).id,
                    abundance,
                    self.opts.min_abund,
                    self.opts.max_abund
                );
                continue;
            }

            self.stats.num_partitions += 1;
            self.stats.num_reads_yielded += members.len();
            return Some(Partition {
                graph: self.graph,
                number: self.stats.num_partitions,
                members,
                abundance,
            });
        }
        None
    }
}

impl FusedIterator for Partitions<'_> {}

impl ReadGraph {
    /// Start a traversal yielding connected components lazily
    ///
    /// Marks the graph consumed; a second call fails until
    /// [`ReadGraph::reset_traversal`] is called. A graph whose edges were
    /// never populated yields one partition per read (or per group of
    /// identical reads under dedup).
    ///
    /// # Errors
    /// Returns [`ReadGraphError::GraphAlreadyConsumed`] if a traversal was
    /// already started
    pub fn partitions(&self, opts: PartitionOptions) -> Result<Partitions<'_>, ReadGraphError> {
        if self.consumed.replace(true) {
            return Err(ReadGraphError::GraphAlreadyConsumed);
        }
        Ok(Partitions::new(self, opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edges::EdgePolicy;
    use crate::record::KmerAnnotation;
    use std::convert::Infallible;

    fn build(records: &[(&str, &str, &[(&str, u64, u64)])], policy: EdgePolicy) -> ReadGraph {
        let stream = records.iter().map(|&(id, seq, annots)| {
            Ok::<_, Infallible>(AugmentedRecord::new(
                id,
                seq,
                annots
                    .iter()
                    .map(|&(k, case, ctrl)| KmerAnnotation::new(k, case, ctrl))
                    .collect(),
            ))
        });
        let mut g = ReadGraph::load(stream, None, None).unwrap();
        g.populate_edges(policy, 1).unwrap();
        g
    }

    fn names(parts: Partitions<'_>) -> Vec<Vec<String>> {
        parts
            .map(|p| p.read_ids().into_iter().map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_components_in_load_order() {
        let g = build(
            &[
                ("a", "AAAAAAAA", &[("GGGG", 4, 0)]),
                ("b", "CCCCCCCC", &[("ACGT", 4, 0)]),
                ("c", "GGGGGGGG", &[("CCCC", 4, 0)]),
                ("d", "TTTTTTTT", &[]),
            ],
            EdgePolicy::Strict,
        );
        let parts = g.partitions(PartitionOptions::default()).unwrap();
        assert_eq!(
            names(parts),
            vec![vec!["a", "c"], vec!["b"], vec!["d"]]
        );
    }

    #[test]
    fn test_transitive_component() {
        let g = build(
            &[
                ("a", "ACGTACGT", &[("AAAC", 4, 0)]),
                ("b", "TTTTACGT", &[("AAAC", 4, 0), ("CCCA", 4, 0)]),
                ("c", "GGGGACGT", &[("CCCA", 4, 0)]),
            ],
            EdgePolicy::Strict,
        );
        let parts: Vec<_> = g.partitions(PartitionOptions::default()).unwrap().collect();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].node_ids(), &[0, 1, 2]);
        assert_eq!(parts[0].number(), 1);
        // AAAC + CCCA, each counted once
        assert_eq!(parts[0].abundance(), 8);
    }

    #[test]
    fn test_dedup_restores_members_and_counts_once() {
        let g = build(
            &[
                ("r1", "ACGTACGT", &[("ACGT", 5, 0)]),
                ("r2", "ACGTACGT", &[("ACGT", 5, 0)]),
                ("r3", "TTTTGGGG", &[("TTTTG", 7, 0)]),
            ],
            EdgePolicy::Strict,
        );
        let mut parts = g
            .partitions(PartitionOptions { dedup: true, ..Default::default() })
            .unwrap();
        let first = parts.next().unwrap();
        assert_eq!(first.read_ids(), vec!["r1", "r2"]);
        assert_eq!(first.abundance(), 5);
        assert_eq!(parts.next().unwrap().read_ids(), vec!["r3"]);
        assert!(parts.next().is_none());
        assert_eq!(parts.stats().num_collapsed, 1);
    }

    #[test]
    fn test_dedup_merges_duplicates_without_edges() {
        let g = build(
            &[
                ("r1", "ACGTACGT", &[]),
                ("r2", "TTTTTTTT", &[]),
                ("r3", "ACGTACGT", &[]),
            ],
            EdgePolicy::Strict,
        );
        let parts = g.partitions(PartitionOptions::default()).unwrap();
        assert_eq!(names(parts), vec![vec!["r1", "r3"], vec!["r2"]]);
    }

    #[test]
    fn test_abundance_filter() {
        let g = build(
            &[
                ("r1", "ACGTACGT", &[("ACGT", 5, 0)]),
                ("r2", "TTACGTAA", &[("ACGT", 3, 0)]),
                ("r3", "GGGGCCCC", &[("GGGG", 40, 0)]),
            ],
            EdgePolicy::Strict,
        );
        let opts = PartitionOptions {
            dedup: false,
            min_abund: Some(10),
            max_abund: None,
            abund_filter: true,
        };
        let mut parts = g.partitions(opts).unwrap();
        let kept: Vec<_> = parts.by_ref().map(|p| p.read_ids().join(",")).collect();
        assert_eq!(kept, vec!["r3"]);
        assert_eq!(parts.stats().num_filtered, 1);
        assert_eq!(parts.stats().num_reads_filtered, 2);
        assert_eq!(parts.stats().num_reads_yielded, 1);
    }

    #[test]
    fn test_abundance_saturates() {
        let g = build(
            &[
                ("a", "ACGTACGT", &[("ACGT", u64::MAX, 0), ("GGGG", 5, 0)]),
                ("b", "TTACGTAA", &[("ACGT", 3, 0), ("GATC", u64::MAX - 1, 0)]),
            ],
            EdgePolicy::Strict,
        );
        let opts = PartitionOptions {
            dedup: true,
            min_abund: Some(u64::MAX),
            max_abund: None,
            abund_filter: true,
        };
        let parts: Vec<_> = g.partitions(opts).unwrap().collect();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].abundance(), u64::MAX);
    }

    #[test]
    fn test_second_traversal_fails_until_reset() {
        let mut g = build(&[("r1", "ACGT", &[])], EdgePolicy::Strict);
        assert_eq!(g.partitions(PartitionOptions::default()).unwrap().count(), 1);
        assert!(g.is_consumed());
        assert!(matches!(
            g.partitions(PartitionOptions::default()),
            Err(ReadGraphError::GraphAlreadyConsumed)
        ));
        g.reset_traversal();
        assert_eq!(g.partitions(PartitionOptions::default()).unwrap().count(), 1);
    }

    #[test]
    fn test_fused() {
        let g = build(&[("r1", "ACGT", &[])], EdgePolicy::Strict);
        let mut parts = g.partitions(PartitionOptions::default()).unwrap();
        assert!(parts.next().is_some());
        assert!(parts.next().is_none());
        assert!(parts.next().is_none());
    }
}
