//! Chain table generator
//!
//! Turns the incidence relation produced by the data placement model into
//! storage target and chain tables, plus the admin commands that create and
//! remove those targets.
//!
//! Usage:
//!   chaintable-gen --type CR -b 10001 -e 10005 -d 16 -r 6 -m incidence.json -o output
//!   chaintable-gen --config placement.toml -m incidence.json --dry-run

mod output;

use anyhow::{Context, Result};
use chaintable_common::{ChainTableType, Config};
use chaintable_placement::{IncidenceRelation, generate_chains};
use clap::Parser;
use output::RenderedOutput;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "chaintable-gen")]
#[command(about = "Generate storage target and chain tables")]
#[command(version)]
struct Args {
    /// Configuration file path (TOML); command line flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CR - Chain Replication; EC - Erasure Coding
    #[arg(short = 't', long, visible_alias = "type")]
    chain_table_type: Option<ChainTableType>,

    /// The first node id
    #[arg(short = 'b', long)]
    node_id_begin: Option<u32>,

    /// The last node id
    #[arg(short = 'e', long)]
    node_id_end: Option<u32>,

    /// Number of disks on each storage node
    #[arg(short = 'd', long)]
    num_disks_per_node: Option<u32>,

    /// Number of storage targets on each disk
    #[arg(short = 'r', long)]
    num_targets_per_disk: Option<u32>,

    /// Prefix of generated target ids
    #[arg(long)]
    target_id_prefix: Option<u32>,

    /// Prefix of generated chain ids
    #[arg(long)]
    chain_id_prefix: Option<u32>,

    /// Supported file chunk sizes
    #[arg(long = "chunk-size", num_args = 1..)]
    chunk_sizes: Vec<String>,

    /// Leave --use-new-chunk-engine off the create-target commands
    #[arg(long)]
    legacy_chunk_engine: bool,

    /// Incidence matrix generated by the data placement model (JSON)
    #[arg(short = 'm', long)]
    incidence_matrix_path: PathBuf,

    /// Directory for the generated files
    #[arg(short, long)]
    output_path: Option<PathBuf>,

    /// Generate and validate only, write no files
    #[arg(long)]
    dry_run: bool,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Overlay command line values on the configuration file
    fn merge_into(&self, config: &mut Config) {
        let topology = &mut config.topology;
        if let Some(v) = self.chain_table_type {
            topology.chain_table_type = v;
        }
        if let Some(v) = self.node_id_begin {
            topology.node_id_begin = v;
        }
        if let Some(v) = self.node_id_end {
            topology.node_id_end = v;
        }
        if let Some(v) = self.num_disks_per_node {
            topology.num_disks_per_node = v;
        }
        if let Some(v) = self.num_targets_per_disk {
            topology.num_targets_per_disk = v;
        }
        if let Some(v) = self.target_id_prefix {
            topology.target_id_prefix = v;
        }
        if let Some(v) = self.chain_id_prefix {
            topology.chain_id_prefix = v;
        }

        if !self.chunk_sizes.is_empty() {
            config.output.chunk_sizes.clone_from(&self.chunk_sizes);
        }
        if self.legacy_chunk_engine {
            config.output.use_new_chunk_engine = false;
        }
        if let Some(path) = &self.output_path {
            config.output.output_path.clone_from(path);
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
    }
}

/// Read the configuration file, if any, and apply the command line on top
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    args.merge_into(&mut config);
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    run(&args, &config)
}

fn run(args: &Args, config: &Config) -> Result<()> {
    let topology = &config.topology;
    topology
        .validate()
        .context("Invalid topology parameters")?;

    info!("Chain table type: {}", topology.chain_table_type);
    info!(
        "Nodes {}..={}, {} disks per node, {} targets per disk",
        topology.node_id_begin,
        topology.node_id_end,
        topology.num_disks_per_node,
        topology.num_targets_per_disk
    );

    let path = &args.incidence_matrix_path;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read incidence matrix {}", path.display()))?;
    let relation = IncidenceRelation::from_json(&text, topology)
        .with_context(|| format!("Failed to load incidence matrix {}", path.display()))?;

    let table = generate_chains(topology, &relation).context("Chain table generation failed")?;
    let rendered = RenderedOutput::render(table.chains(), &config.output);

    if args.dry_run {
        for (name, contents) in rendered.files() {
            info!("Dry run: {} ({} lines)", name, contents.lines().count());
        }
        return Ok(());
    }

    rendered.write_to(&config.output.output_path)?;
    info!(
        "Chain table written to {}",
        config.output.output_path.display()
    );
    Ok(())
}
