//! Integration tests for the partitioning pipeline
//!
//! These tests exercise load -> populate edges -> partition end to end.

use readgraph_lib::augfastx::{open_augmented, write_augmented};
use readgraph_lib::graph::{EdgePolicy, PartitionOptions, ReadGraph};
use readgraph_lib::kmer::{canonicalize, reverse_complement};
use readgraph_lib::record::{AugmentedRecord, KmerAnnotation};
use readgraph_lib::{partition_reads, PartitionConfiguration};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::io::Write;

fn record(id: &str, seq: &str, annots: &[(&str, u64, u64)]) -> AugmentedRecord {
    AugmentedRecord::new(
        id,
        seq,
        annots
            .iter()
            .map(|&(k, case, ctrl)| KmerAnnotation::new(k, case, ctrl))
            .collect(),
    )
}

fn stream(records: &[AugmentedRecord]) -> impl Iterator<Item = Result<AugmentedRecord, Infallible>> + '_ {
    records.iter().cloned().map(Ok)
}

fn build(
    records: &[AugmentedRecord],
    policy: EdgePolicy,
    min_abund: Option<u64>,
    max_abund: Option<u64>,
) -> ReadGraph {
    let mut graph = ReadGraph::load(stream(records), min_abund, max_abund).unwrap();
    graph.populate_edges(policy, 1).unwrap();
    graph
}

fn groups(graph: &ReadGraph, opts: PartitionOptions) -> Vec<Vec<String>> {
    graph
        .partitions(opts)
        .unwrap()
        .map(|p| p.read_ids().into_iter().map(String::from).collect())
        .collect()
}

fn scenario_a() -> Vec<AugmentedRecord> {
    vec![
        record("R1", "ACGTACGT", &[("ACGT", 5, 0)]),
        record("R2", "TTACGTAA", &[("ACGT", 3, 0)]),
        record("R3", "GGGGCCCC", &[("GGGG", 4, 0)]),
    ]
}

/// A slightly larger data set: three loci with overlapping reads, a few
/// duplicates, reads on the reverse strand, and noise k-mers.
fn mixed_reads() -> Vec<AugmentedRecord> {
    let loci = [
        ("AAACCCGGGT", "CCGGA"),
        ("TTGACCATGA", "GACCA"),
        ("GCGCATATTC", "CATAT"),
    ];
    let mut records = Vec::new();
    for (l, (seq, kmer)) in loci.iter().enumerate() {
        for i in 0..5u64 {
            let seq = if i % 2 == 1 {
                String::from_utf8(reverse_complement(seq.as_bytes()).unwrap()).unwrap()
            } else {
                seq.to_string()
            };
            let annotated = if i % 2 == 1 {
                String::from_utf8(reverse_complement(kmer.as_bytes()).unwrap()).unwrap()
            } else {
                kmer.to_string()
            };
            let mut annots = vec![KmerAnnotation::new(annotated, 2 + i * 3, 0)];
            if i == 4 {
                // noisy k-mer shared with the next locus
                annots.push(KmerAnnotation::new("TTTTT", 9, 4));
            }
            let seq = if i == 3 { format!("{seq}A") } else { seq };
            records.push(AugmentedRecord::new(format!("L{l}_{i}"), seq, annots));
        }
    }
    // exact duplicate of L0_0
    records.push(record("dup", "AAACCCGGGT", &[("CCGGA", 2, 0)]));
    records
}

#[test]
fn test_scenario_a_strict_shared_kmer() {
    let graph = build(&scenario_a(), EdgePolicy::Strict, None, None);
    assert_eq!(
        groups(&graph, PartitionOptions::default()),
        vec![vec!["R1", "R2"], vec!["R3"]]
    );
}

#[test]
fn test_scenario_b_abundance_filter() {
    // With min_abund=10 no annotation reaches the bound: nothing is indexed,
    // every read is a singleton with abundance 5, 3 or 4, all below 10.
    let config = PartitionConfiguration {
        strict: true,
        min_abund: Some(10),
        ..Default::default()
    };
    let mut yielded = Vec::new();
    let summary = partition_reads(stream(&scenario_a()), config, |p| {
        yielded.push(p.read_ids().join(","));
        Ok(())
    })
    .unwrap();
    assert!(yielded.is_empty());
    assert_eq!(summary.load.num_out_of_range, 3);
    assert_eq!(summary.partition.num_filtered, 3);
    assert_eq!(summary.partition.num_reads_filtered, 3);

    // Filtering at traversal time only: {R1,R2} sums to 5, {R3} to 4.
    let graph = build(&scenario_a(), EdgePolicy::Strict, None, None);
    let opts = PartitionOptions {
        dedup: true,
        min_abund: Some(5),
        max_abund: None,
        abund_filter: true,
    };
    assert_eq!(groups(&graph, opts), vec![vec!["R1", "R2"]]);
}

#[test]
fn test_scenario_c_dedup_counts_abundance_once() {
    let records = vec![
        record("D1", "ACGTACGT", &[("ACGT", 6, 0)]),
        record("D2", "ACGTACGT", &[("ACGT", 6, 0)]),
    ];
    let graph = build(&records, EdgePolicy::Strict, None, None);
    let opts = PartitionOptions {
        dedup: true,
        min_abund: Some(6),
        max_abund: Some(6),
        abund_filter: true,
    };
    let parts: Vec<_> = graph.partitions(opts).unwrap().collect();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].read_ids(), vec!["D1", "D2"]);
    assert_eq!(parts[0].abundance(), 6);
}

#[test]
fn test_scenario_d_relaxed_vs_strict() {
    let records = vec![
        record("A", "ACGTTGCA", &[("GTTGC", 8, 3)]),
        record("B", "CCGTTGCT", &[("GTTGC", 8, 3)]),
    ];
    let strict = build(&records, EdgePolicy::Strict, None, None);
    assert_eq!(
        groups(&strict, PartitionOptions::default()),
        vec![vec!["A"], vec!["B"]]
    );

    let relaxed = build(&records, EdgePolicy::Relaxed { min_shared: 1 }, None, None);
    assert_eq!(
        groups(&relaxed, PartitionOptions::default()),
        vec![vec!["A", "B"]]
    );
}

#[test]
fn test_coverage_and_disjointness() {
    let records = mixed_reads();
    for policy in [EdgePolicy::Strict, EdgePolicy::Relaxed { min_shared: 1 }] {
        for dedup in [false, true] {
            let graph = build(&records, policy, None, None);
            let opts = PartitionOptions {
                dedup,
                min_abund: Some(10),
                max_abund: None,
                abund_filter: true,
            };
            let mut parts = graph.partitions(opts).unwrap();
            let mut seen = BTreeSet::new();
            let mut yielded = 0;
            for part in parts.by_ref() {
                for &node in part.node_ids() {
                    assert!(seen.insert(node), "read {node} yielded twice");
                }
                yielded += part.len();
            }
            let stats = parts.stats();
            assert_eq!(yielded, stats.num_reads_yielded);
            assert_eq!(
                stats.num_reads_yielded + stats.num_reads_filtered,
                records.len(),
                "{policy:?} dedup={dedup}"
            );
        }
    }
}

#[test]
fn test_strict_reachability() {
    let records = mixed_reads();
    let graph = build(&records, EdgePolicy::Strict, None, None);
    let parts: Vec<BTreeSet<String>> = groups(&graph, PartitionOptions::default())
        .into_iter()
        .map(|g| g.into_iter().collect())
        .collect();
    let part_of = |id: &str| parts.iter().position(|p| p.contains(id)).unwrap();

    for a in &records {
        for b in &records {
            let shared = a.interesting().any(|ka| {
                let ca = canonicalize(ka.sequence.as_bytes()).unwrap();
                b.interesting()
                    .any(|kb| canonicalize(kb.sequence.as_bytes()).unwrap() == ca)
            });
            if shared {
                assert_eq!(part_of(&a.id), part_of(&b.id), "{} / {}", a.id, b.id);
            }
        }
    }
    // both strands of each locus land together
    assert_eq!(parts.len(), 3);
}

#[test]
fn test_widening_bounds_never_splits() {
    let records = mixed_reads();
    let opts = PartitionOptions {
        dedup: false,
        ..Default::default()
    };
    let narrow = build(&records, EdgePolicy::Strict, Some(5), Some(11));
    let wide = build(&records, EdgePolicy::Strict, Some(2), None);
    let narrow_groups = groups(&narrow, opts);
    let wide_groups: Vec<BTreeSet<String>> = groups(&wide, opts)
        .into_iter()
        .map(|g| g.into_iter().collect())
        .collect();

    assert!(wide_groups.len() <= narrow_groups.len());
    for group in narrow_groups {
        assert!(
            wide_groups
                .iter()
                .any(|w| group.iter().all(|id| w.contains(id))),
            "{group:?} was split by widening the bounds"
        );
    }
}

#[test]
fn test_dedup_is_repeatable() {
    let records = mixed_reads();
    let opts = PartitionOptions {
        dedup: true,
        ..Default::default()
    };
    let first = groups(&build(&records, EdgePolicy::Strict, None, None), opts);
    let second = groups(&build(&records, EdgePolicy::Strict, None, None), opts);
    assert_eq!(first, second);

    // reset on the same graph gives the same answer too
    let mut graph = build(&records, EdgePolicy::Strict, None, None);
    let once = groups(&graph, opts);
    graph.reset_traversal();
    assert_eq!(groups(&graph, opts), once);
    assert_eq!(once, first);
}

#[test]
fn test_file_to_partitions() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    for rec in scenario_a() {
        write_augmented(&rec, &mut file)?;
    }
    file.flush()?;

    let config = PartitionConfiguration { strict: true, ..Default::default() };
    let mut sizes = Vec::new();
    let summary = partition_reads(open_augmented(file.path())?, config, |p| {
        sizes.push(p.len());
        Ok(())
    })?;
    assert_eq!(sizes, vec![2, 1]);
    assert_eq!(summary.load.num_reads, 3);
    Ok(())
}
