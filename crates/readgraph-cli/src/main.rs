use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use readgraph_lib::augfastx::{create_output, open_augmented, write_augmented};
use readgraph_lib::constants::LOG_PREFIX;
use readgraph_lib::graph::{EdgePolicy, PartitionOptions};
use readgraph_lib::pipeline::PartitionPipeline;
use readgraph_lib::{GmlExporter, GraphExport, PartitionConfiguration};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "readgraph")]
#[command(version)]
#[command(about = "Partition reads by shared novel k-mers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options controlling graph construction and traversal
#[derive(Args, Debug, Clone)]
struct GraphArgs {
    /// Augmented FASTQ/FASTA input (may be gzipped, `-` for stdin)
    #[arg(short, long)]
    augfastq: String,

    /// Link reads only through shared interesting k-mers
    #[arg(long, default_value = "false")]
    strict: bool,

    /// Minimum k-mer abundance (also the minimum component abundance)
    #[arg(long)]
    min_abund: Option<u64>,

    /// Maximum k-mer abundance (also the maximum component abundance)
    #[arg(long)]
    max_abund: Option<u64>,

    /// Keep duplicate reads as separate nodes
    #[arg(long, default_value = "false")]
    no_dedup: bool,

    /// Do not drop components by abundance
    #[arg(long, default_value = "false")]
    no_abund_filter: bool,

    /// Shared k-mers required to link two reads in relaxed mode
    #[arg(long, default_value = "1")]
    relaxed_min_shared: usize,

    /// Number of threads for edge generation (0 = all available cores)
    #[arg(short = 't', long, default_value = "1")]
    threads: usize,
}

impl GraphArgs {
    fn config(&self) -> PartitionConfiguration {
        PartitionConfiguration {
            strict: self.strict,
            relaxed_min_shared: self.relaxed_min_shared,
            min_abund: self.min_abund,
            max_abund: self.max_abund,
            dedup: !self.no_dedup,
            abund_filter: !self.no_abund_filter,
            num_threads: self.threads,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Partition reads into connected components
    Partition {
        #[command(flatten)]
        graph: GraphArgs,

        /// Output prefix; writes PREFIX.cc.log and PREFIX.ccN.augfastq.gz
        #[arg(short, long)]
        outprefix: String,

        /// Also write the read graph in GML format
        #[arg(long)]
        gml: Option<String>,
    },

    /// Build the read graph and report index and component statistics
    Stats {
        #[command(flatten)]
        graph: GraphArgs,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing: use RUST_LOG if set, otherwise default to info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Partition { graph, outprefix, gml } => {
            partition_command(&graph, &outprefix, gml.as_deref())?;
        }
        Commands::Stats { graph } => {
            stats_command(&graph)?;
        }
    }

    Ok(())
}

/// Create the parent directory of an output prefix if needed
fn ensure_prefix_dir(prefix: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(prefix).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Partition reads and write one augmented file per component
fn partition_command(args: &GraphArgs, outprefix: &str, gml: Option<&str>) -> anyhow::Result<()> {
    ensure_prefix_dir(outprefix)?;

    let mut pipeline = PartitionPipeline::new(args.config()).map_err(anyhow::Error::msg)?;
    let reader = open_augmented(&args.augfastq)?;
    let graph = pipeline.build_graph(reader)?;

    if let Some(path) = gml {
        info!("{LOG_PREFIX} Writing read graph to {}", path);
        let mut out = create_output(path)?;
        GmlExporter.export(&graph, &mut out)?;
        out.finish()
            .with_context(|| format!("Failed to write {path}"))?;
    }

    let log_path = format!("{outprefix}.cc.log");
    let mut cclog = create_output(&log_path)?;
    let mut num_reads = 0usize;
    let summary = pipeline.run(&graph, |part| {
        num_reads += part.len();
        writeln!(
            cclog,
            "CC\t{}\t{}\t{:?}",
            part.number(),
            part.len(),
            part.read_ids()
        )?;
        let out_path = format!("{outprefix}.cc{}.augfastq.gz", part.number());
        let mut out = create_output(&out_path)?;
        for read in part.reads() {
            write_augmented(read, &mut out)?;
        }
        out.finish()
            .with_context(|| format!("Failed to write {out_path}"))?;
        debug!("Wrote partition {} ({} reads) to {}", part.number(), part.len(), out_path);
        Ok(())
    })?;
    cclog
        .finish()
        .with_context(|| format!("Failed to write {log_path}"))?;

    info!(
        "{LOG_PREFIX} grouped {} reads into {} connected components",
        num_reads, summary.partition.num_partitions
    );
    Ok(())
}

/// Build the graph and log statistics without writing anything
fn stats_command(args: &GraphArgs) -> anyhow::Result<()> {
    let config = args.config();
    let mut pipeline = PartitionPipeline::new(config.clone()).map_err(anyhow::Error::msg)?;
    let reader = open_augmented(&args.augfastq)?;
    let graph = pipeline.build_graph(reader)?;

    let load = graph.load_statistics();
    info!("Load Statistics:");
    info!("  Reads: {}", load.num_reads);
    info!("  Annotations: {}", load.num_annotations);
    info!("  Indexed annotations: {} ({} interesting)", load.num_indexed, load.num_interesting);
    info!("  Out of abundance range: {}", load.num_out_of_range);
    info!("  Malformed: {}", load.num_malformed);

    let novel = matches!(config.edge_policy(), EdgePolicy::Strict);
    graph.index().statistics(novel).print_summary();
    info!("Edges: {}", graph.num_edges());

    let opts = PartitionOptions {
        abund_filter: false,
        ..config.partition_options()
    };
    let mut sizes: Vec<usize> = graph.partitions(opts)?.map(|p| p.len()).collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    info!("Components: {}", sizes.len());
    if let Some(largest) = sizes.first() {
        info!("  Largest component: {} reads", largest);
        info!("  Singletons: {}", sizes.iter().filter(|&&s| s == 1).count());
    }
    Ok(())
}
