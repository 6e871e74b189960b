//! End-to-end partitioning driver
//!
//! Composes the three stages (load, populate edges, partition) with
//! progress logging and stage timing:
//!
//! ```
//! use readgraph_lib::pipeline::PartitionPipeline;
//! use readgraph_lib::record::{AugmentedRecord, KmerAnnotation};
//! use readgraph_lib::PartitionConfiguration;
//!
//! let reads = vec![
//!     AugmentedRecord::new("r1", "ACGTACGT", vec![KmerAnnotation::new("ACGT", 5, 0)]),
//!     AugmentedRecord::new("r2", "TTACGTAA", vec![KmerAnnotation::new("ACGT", 3, 0)]),
//! ];
//! let config = PartitionConfiguration { strict: true, ..Default::default() };
//! let mut pipeline = PartitionPipeline::new(config).unwrap();
//! let graph = pipeline
//!     .build_graph(reads.into_iter().map(Ok::<_, std::convert::Infallible>))
//!     .unwrap();
//! let mut groups = Vec::new();
//! let summary = pipeline
//!     .run(&graph, |part| {
//!         groups.push(part.read_ids().join(","));
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(groups, vec!["r1,r2"]);
//! assert_eq!(summary.partition.num_partitions, 1);
//! ```

use crate::constants::{LOG_PREFIX, STAGE_EDGES, STAGE_LOAD, STAGE_PARTITION};
use crate::graph::{
    EdgeStatistics, LoadStatistics, Partition, PartitionConfiguration, PartitionStats,
    ReadGraph, ReadGraphError,
};
use crate::record::AugmentedRecord;
use crate::timer::{StageTimer, TOTAL};
use anyhow::Result;
use tracing::info;

/// Outcome of a partitioning run
///
/// Filtered components and collapsed duplicates are reported here as
/// counts; they are expected outcomes, not failures.
#[derive(Debug, Clone, Default)]
pub struct PartitionSummary {
    /// Counters from loading
    pub load: LoadStatistics,
    /// Counters from edge population
    pub edges: EdgeStatistics,
    /// Counters from traversal
    pub partition: PartitionStats,
    /// Stage durations in seconds, in completion order
    pub timings: Vec<(String, f64)>,
}

/// Stateful driver for one partitioning run
pub struct PartitionPipeline {
    config: PartitionConfiguration,
    timer: StageTimer,
    load: LoadStatistics,
    edges: EdgeStatistics,
}

impl PartitionPipeline {
    /// Create a pipeline after validating the configuration
    pub fn new(config: PartitionConfiguration) -> Result<Self, String> {
        config.validate()?;
        let mut timer = StageTimer::new();
        timer.start(TOTAL);
        Ok(Self {
            config,
            timer,
            load: LoadStatistics::default(),
            edges: EdgeStatistics::default(),
        })
    }

    /// Configuration of this run
    pub fn config(&self) -> &PartitionConfiguration {
        &self.config
    }

    /// Load reads and populate edges
    pub fn build_graph<I, E>(&mut self, stream: I) -> Result<ReadGraph, ReadGraphError>
    where
        I: IntoIterator<Item = Result<AugmentedRecord, E>>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        self.config.print();

        self.timer.start(STAGE_LOAD);
        info!("{LOG_PREFIX} Loading reads");
        let mut graph = ReadGraph::load(stream, self.config.min_abund, self.config.max_abund)?;
        let elapsed = self.timer.stop(STAGE_LOAD);
        self.load = graph.load_statistics().clone();
        info!(
            "{LOG_PREFIX} {} reads loaded in {:.2} sec ({} k-mers indexed, {} malformed annotations dropped)",
            self.load.num_reads, elapsed, graph.index().len(), self.load.num_malformed
        );

        self.timer.start(STAGE_EDGES);
        let policy = self.config.edge_policy();
        info!("{LOG_PREFIX} Building read graph in {} mode", policy.name());
        self.edges = graph.populate_edges(policy, self.config.num_threads)?;
        let elapsed = self.timer.stop(STAGE_EDGES);
        info!("{LOG_PREFIX} Graph built in {:.2} sec", elapsed);

        Ok(graph)
    }

    /// Traverse `graph` and hand every partition to `sink`
    ///
    /// Stops at the first error returned by `sink`.
    pub fn run<F>(&mut self, graph: &ReadGraph, mut sink: F) -> Result<PartitionSummary>
    where
        F: FnMut(&Partition<'_>) -> Result<()>,
    {
        self.timer.start(STAGE_PARTITION);
        info!("{LOG_PREFIX} Partition readgraph");
        let mut parts = graph.partitions(self.config.partition_options())?;
        for part in parts.by_ref() {
            sink(&part)?;
        }
        let stats = parts.stats().clone();
        let elapsed = self.timer.stop(STAGE_PARTITION);
        info!("{LOG_PREFIX} Partitioning done in {:.2} sec", elapsed);
        if stats.num_filtered > 0 {
            info!(
                "{LOG_PREFIX} {} components ({} reads) excluded by abundance filter",
                stats.num_filtered, stats.num_reads_filtered
            );
        }

        let total = self.timer.stop(TOTAL);
        info!("{LOG_PREFIX} Total time: {:.2} seconds", total);

        Ok(PartitionSummary {
            load: self.load.clone(),
            edges: self.edges.clone(),
            partition: stats,
            timings: self.timer.stages().to_vec(),
        })
    }
}

/// Run the whole pipeline over a record stream
pub fn partition_reads<I, E, F>(
    stream: I,
    config: PartitionConfiguration,
    sink: F,
) -> Result<PartitionSummary>
where
    I: IntoIterator<Item = Result<AugmentedRecord, E>>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
    F: FnMut(&Partition<'_>) -> Result<()>,
{
    let mut pipeline = PartitionPipeline::new(config).map_err(anyhow::Error::msg)?;
    let graph = pipeline.build_graph(stream)?;
    pipeline.run(&graph, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KmerAnnotation;
    use std::convert::Infallible;

    fn reads() -> Vec<Result<AugmentedRecord, Infallible>> {
        vec![
            Ok(AugmentedRecord::new("r1", "ACGTACGT", vec![KmerAnnotation::new("ACGT", 5, 0)])),
            Ok(AugmentedRecord::new("r2", "TTACGTAA", vec![KmerAnnotation::new("ACGT", 3, 0)])),
            Ok(AugmentedRecord::new("r3", "GGGGCCCC", vec![KmerAnnotation::new("GGGG", 4, 0)])),
        ]
    }

    #[test]
    fn test_partition_reads_summary() {
        let config = PartitionConfiguration { strict: true, ..Default::default() };
        let mut sizes = Vec::new();
        let summary = partition_reads(reads(), config, |part| {
            sizes.push(part.len());
            Ok(())
        })
        .unwrap();

        assert_eq!(sizes, vec![2, 1]);
        assert_eq!(summary.load.num_reads, 3);
        assert_eq!(summary.edges.num_edges, 1);
        assert_eq!(summary.partition.num_partitions, 2);
        assert_eq!(summary.partition.num_filtered, 0);
        let labels: Vec<_> = summary.timings.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec![STAGE_LOAD, STAGE_EDGES, STAGE_PARTITION, TOTAL]);
    }

    #[test]
    fn test_sink_error_stops_run() {
        let config = PartitionConfiguration::default();
        let mut calls = 0;
        let result = partition_reads(reads(), config, |_| {
            calls += 1;
            anyhow::bail!("disk full")
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PartitionConfiguration { relaxed_min_shared: 0, ..Default::default() };
        assert!(PartitionPipeline::new(config).is_err());
    }

    #[test]
    fn test_empty_input_is_error() {
        let empty: Vec<Result<AugmentedRecord, Infallible>> = Vec::new();
        let err = partition_reads(empty, PartitionConfiguration::default(), |_| Ok(())).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReadGraphError>(),
            Some(ReadGraphError::EmptyReadSet)
        ));
    }
}
