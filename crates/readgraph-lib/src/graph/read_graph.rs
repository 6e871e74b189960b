//! The read graph: loaded reads, their k-mer index, and the edges between
//! them.

use crate::graph::edges::{Edge, EdgePolicy};
use crate::graph::error::ReadGraphError;
use crate::graph::index::KmerIndex;
use crate::graph::load::{load_reads, LoadStatistics, ReadSet};
use crate::graph::NodeId;
use crate::hasher::DetHashMap;
use crate::record::AugmentedRecord;
use std::cell::Cell;

/// Reads linked by shared k-mers
///
/// Built in two steps: [`ReadGraph::load`] creates the nodes and the k-mer
/// index, [`ReadGraph::populate_edges`] adds the edges. After that the
/// graph is read-only apart from the traversal flag set by
/// [`ReadGraph::partitions`].
#[derive(Debug)]
pub struct ReadGraph {
    pub(super) reads: ReadSet,
    pub(super) index: KmerIndex,
    pub(super) load_stats: LoadStatistics,
    /// Neighbors of each node as (neighbor, edge id), in edge insertion order
    pub(super) adjacency: Vec<Vec<(NodeId, u32)>>,
    pub(super) edges: Vec<Edge>,
    pub(super) edge_lookup: DetHashMap<(NodeId, NodeId), u32>,
    pub(super) policy: Option<EdgePolicy>,
    pub(super) consumed: Cell<bool>,
}

impl ReadGraph {
    /// Load reads from a record stream
    ///
    /// See [`load_reads`] for the abundance bounds and error behavior.
    pub fn load<I, E>(
        stream: I,
        min_abund: Option<u64>,
        max_abund: Option<u64>,
    ) -> Result<Self, ReadGraphError>
    where
        I: IntoIterator<Item = Result<AugmentedRecord, E>>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (reads, index, load_stats) = load_reads(stream, min_abund, max_abund)?;
        Ok(Self::from_parts(reads, index, load_stats))
    }

    /// Assemble an edgeless graph from loaded parts
    pub fn from_parts(reads: ReadSet, index: KmerIndex, load_stats: LoadStatistics) -> Self {
        let num_reads = reads.len();
        Self {
            reads,
            index,
            load_stats,
            adjacency: vec![Vec::new(); num_reads],
            edges: Vec::new(),
            edge_lookup: crate::hasher::new_map(),
            policy: None,
            consumed: Cell::new(false),
        }
    }

    /// Number of nodes
    pub fn num_reads(&self) -> usize {
        self.reads.len()
    }

    /// Number of edges
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Read stored at a node
    ///
    /// # Panics
    /// Panics if `node` is out of range
    pub fn read(&self, node: NodeId) -> &AugmentedRecord {
        self.reads.get(node)
    }

    /// Node id of a read name
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.reads.node_id(name)
    }

    /// Read with the given name
    pub fn get_record(&self, name: &str) -> Option<&AugmentedRecord> {
        self.node_id(name).map(|node| self.read(node))
    }

    /// All reads in load order
    pub fn reads(&self) -> impl ExactSizeIterator<Item = &AugmentedRecord> {
        self.reads.iter()
    }

    /// The k-mer index built at load time
    pub fn index(&self) -> &KmerIndex {
        &self.index
    }

    /// Counters collected at load time
    pub fn load_statistics(&self) -> &LoadStatistics {
        &self.load_stats
    }

    /// Edges in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Neighbors of a node with edge weights, in edge insertion order
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, u32)> + '_ {
        self.adjacency[node as usize]
            .iter()
            .map(move |&(other, edge)| (other, self.edges[edge as usize].weight))
    }

    /// Weight of the edge between two reads, if any
    pub fn edge_weight(&self, a: NodeId, b: NodeId) -> Option<u32> {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.edge_lookup
            .get(&key)
            .map(|&edge| self.edges[edge as usize].weight)
    }

    /// Policy the edges were built with, `None` before population
    pub fn policy(&self) -> Option<EdgePolicy> {
        self.policy
    }

    /// Whether a traversal has already been started
    pub fn is_consumed(&self) -> bool {
        self.consumed.get()
    }

    /// Allow [`ReadGraph::partitions`] to run again
    pub fn reset_traversal(&mut self) {
        self.consumed.set(false);
    }
}
