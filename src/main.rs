//! # Butterfly-partition CLI
//!
//! Builds, inspects, queries and validates packed multi-level partitions.

use anyhow::{Context, Result};
use butterfly_partition::{
    validate_partition, LevelID, MultiLevelPartition, NodeID, PackedMultiLevelPartition, PartitionMlpFile,
    RawPartition,
};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Command-line interface for butterfly-partition
#[derive(Parser)]
#[command(name = "butterfly-partition")]
#[command(about = "Packed multi-level partition index for hierarchical routing")]
#[command(long_about = "Builds and queries multi-level partitions:
  butterfly-partition build --input raw.json --output graph.mlp
  butterfly-partition inspect graph.mlp
  butterfly-partition cell graph.mlp --level 2 --node 17
  butterfly-partition diff graph.mlp 17 4711
  butterfly-partition query-level graph.mlp --start 17 --target 4711 --node 99
  butterfly-partition validate graph.mlp")]
#[command(version = env!("BUTTERFLY_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a packed partition from raw per-level groupings (JSON)
    Build {
        /// Raw partition JSON ({"level_to_num_cells": [...], "partitions": [[...], ...]})
        #[arg(short, long)]
        input: PathBuf,

        /// Output partition.mlp file
        #[arg(short, long)]
        output: PathBuf,

        /// Run the invariant checks before writing
        #[arg(long)]
        validate: bool,
    },

    /// Print the level layout and cell counts
    Inspect {
        /// partition.mlp file
        partition: PathBuf,
    },

    /// Cell of a node at a level
    Cell {
        /// partition.mlp file
        partition: PathBuf,

        #[arg(short, long)]
        level: LevelID,

        #[arg(short, long)]
        node: NodeID,
    },

    /// Highest level at which two nodes are in different cells
    Diff {
        /// partition.mlp file
        partition: PathBuf,

        first: NodeID,

        second: NodeID,
    },

    /// Level at which a node is relevant for a start → target query
    QueryLevel {
        /// partition.mlp file
        partition: PathBuf,

        #[arg(long)]
        start: NodeID,

        #[arg(long)]
        target: NodeID,

        #[arg(long)]
        node: NodeID,
    },

    /// Check partition invariants (exit code 1 on failure)
    Validate {
        /// partition.mlp file
        partition: PathBuf,

        /// Number of node pairs to cross-check
        #[arg(long, default_value = "100000")]
        sample_pairs: usize,
    },
}

fn main() {
    if let Err(e) = run() {
        error!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stderr);
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    match cli.command {
        Commands::Build {
            input,
            output,
            validate,
        } => build(&input, &output, validate)?,
        Commands::Inspect { partition } => {
            let mlp = load(&partition)?;
            print_layout(&mlp);
        }
        Commands::Cell {
            partition,
            level,
            node,
        } => {
            let mlp = load(&partition)?;
            check_node(&mlp, node)?;
            anyhow::ensure!(
                (level as usize) < mlp.num_levels(),
                "level {} out of range (0..{})",
                level,
                mlp.num_levels()
            );
            println!("{}", mlp.cell(level, node));
        }
        Commands::Diff {
            partition,
            first,
            second,
        } => {
            let mlp = load(&partition)?;
            check_node(&mlp, first)?;
            check_node(&mlp, second)?;
            println!("{}", mlp.highest_different_level(first, second));
        }
        Commands::QueryLevel {
            partition,
            start,
            target,
            node,
        } => {
            let mlp = load(&partition)?;
            for n in [start, target, node] {
                check_node(&mlp, n)?;
            }
            println!("{}", mlp.query_level(start, target, node));
        }
        Commands::Validate {
            partition,
            sample_pairs,
        } => {
            let mlp = load(&partition)?;
            let result = validate_partition(&mlp, sample_pairs);

            println!("\n=== INVARIANT CHECK SUMMARY ===");
            println!("  Checks run:    {}", result.checks_run);
            println!("  Checks passed: {}", result.checks_passed);
            println!("  Errors:        {}", result.errors.len());
            println!("  Warnings:      {}", result.warnings.len());
            for (i, e) in result.errors.iter().enumerate() {
                println!("    {}. {}", i + 1, e);
            }
            for w in &result.warnings {
                println!("    ⚠ {}", w);
            }

            anyhow::ensure!(result.passed, "partition invariants violated");
            println!("✓ All invariants hold");
        }
    }

    Ok(())
}

fn build(input: &Path, output: &Path, validate: bool) -> Result<()> {
    let start = Instant::now();
    info!("Reading raw partition from {}", input.display());
    let raw = RawPartition::read(input)
        .with_context(|| format!("reading raw partition {}", input.display()))?;

    info!(
        "Building partition: {} nodes, {} levels",
        raw.num_nodes(),
        raw.level_to_num_cells.len()
    );
    let mlp = raw.build().context("building packed partition")?;

    if validate {
        let result = validate_partition(&mlp, 100_000);
        anyhow::ensure!(
            result.passed,
            "partition invariants violated: {}",
            result.errors.join("; ")
        );
    }

    PartitionMlpFile::write(output, &mlp)
        .with_context(|| format!("writing {}", output.display()))?;

    print_layout(&mlp);
    println!(
        "✓ Partition written to {} in {:.2}s",
        output.display(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn load(path: &Path) -> Result<PackedMultiLevelPartition> {
    let start = Instant::now();
    let mlp = PartitionMlpFile::read(path).with_context(|| format!("loading {}", path.display()))?;
    info!(
        "Loaded {} ({} nodes) in {:.3}s",
        path.display(),
        mlp.num_nodes(),
        start.elapsed().as_secs_f64()
    );
    Ok(mlp)
}

fn check_node(mlp: &PackedMultiLevelPartition, node: NodeID) -> Result<()> {
    anyhow::ensure!(
        (node as usize) < mlp.num_nodes(),
        "node {} out of range (0..{})",
        node,
        mlp.num_nodes()
    );
    Ok(())
}

fn print_layout(mlp: &PackedMultiLevelPartition) {
    let geometry = mlp.geometry();
    println!("Nodes:  {}", mlp.num_nodes());
    println!(
        "Levels: {} (+ base level), {} of 64 bits used",
        geometry.num_levels(),
        geometry.total_bits()
    );
    println!("  level  cells  declared  bits  offset");
    for level in (1..mlp.num_levels()).map(|level| level as LevelID) {
        println!(
            "  {:>5}  {:>5}  {:>8}  {:>4}  {:>6}",
            level,
            mlp.num_cells(level),
            geometry.level_to_num_cells()[level as usize - 1],
            geometry.bits(level),
            geometry.offset(level)
        );
    }
}
