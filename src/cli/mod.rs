//! Command-line interface for clade-ocl.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **run**: Generate topologies, graft species trees and write OCL tables
//! - **topologies**: List the canonical clade topologies for a set of clades
//! - **inspect**: Show per-topology OCL results for a single orthogroup
//!
//! ## Usage
//!
//! ```text
//! # Full pipeline
//! clade-ocl run -a clades.tsv -t species_tree.newick -g orthogroups.tsv -o results
//!
//! # Same run from a JSON config, overriding the thread count
//! clade-ocl run --config run.json --threads 4
//!
//! # Enumerate topologies only
//! clade-ocl topologies --clades Vertebrata,Mollusca,Outgroup
//!
//! # One orthogroup, JSON output
//! clade-ocl inspect OG0001 -a clades.tsv -t species_tree.newick -g orthogroups.tsv --format json
//! ```

use clap::{Parser, Subcommand};

pub mod inspect;
pub mod run;
pub mod topologies;

#[derive(Parser)]
#[command(name = "clade-ocl")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Origin, conservation and loss of orthogroups across alternative clade topologies")]
#[command(
    long_about = "clade-ocl enumerates every rooted binary topology over a set of clades, grafts the\nspecies-level subtree of each clade onto it and decomposes the result into parent-child\nblocks.\n\nEach orthogroup is then classified on every topology:\n- Origin: the most recent block covering all of its species\n- Conserved / Lost: blocks below the origin that keep or lose it\n- Summaries of how stable the origin is across topologies"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full topology, grafting and OCL pipeline
    Run(run::RunArgs),

    /// Enumerate the canonical clade topologies
    Topologies(topologies::TopologiesArgs),

    /// Inspect one orthogroup across every topology
    Inspect(inspect::InspectArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
