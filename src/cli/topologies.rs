use std::path::PathBuf;

use anyhow::bail;
use clap::Args;

use crate::cli::OutputFormat;
use crate::core::clade::CladeAssignment;
use crate::core::types::{CladeId, RootingConvention};
use crate::parsing::assignments::parse_assignment_file;
use crate::topology::{GeneratedTopology, TopologyGenerator};

#[derive(Args)]
pub struct TopologiesArgs {
    /// Comma-separated clade ids
    #[arg(long, value_delimiter = ',', conflicts_with = "assignments")]
    pub clades: Vec<String>,

    /// Take the clades from an assignment table instead
    #[arg(short, long)]
    pub assignments: Option<PathBuf>,

    /// Outgroup clade, placed first in canonical topologies
    #[arg(long)]
    pub outgroup: Option<String>,

    /// Rooting convention for topology enumeration
    #[arg(long, value_enum, default_value = "anchor")]
    pub rooting: RootingConvention,
}

/// Execute topologies subcommand
///
/// # Errors
///
/// Returns an error if no clades are given or the clade list is invalid.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: TopologiesArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let clades: Vec<CladeId> = if let Some(path) = &args.assignments {
        let rows = parse_assignment_file(path)?;
        CladeAssignment::from_rows(&rows)?.clades().to_vec()
    } else if !args.clades.is_empty() {
        args.clades.iter().map(CladeId::new).collect()
    } else {
        bail!("Provide clades with --clades or --assignments");
    };

    let generator = TopologyGenerator::new(
        &clades,
        args.rooting,
        args.outgroup.as_ref().map(CladeId::new),
    )?;
    let topologies = generator.generate();

    if verbose {
        eprintln!(
            "Generated {} topologies for {} clades (expected {})",
            topologies.len(),
            clades.len(),
            generator.expected_topology_count()
        );
    }

    match format {
        OutputFormat::Text => print_text_topologies(&generator, &topologies),
        OutputFormat::Json => print_json_topologies(&generator, &topologies)?,
        OutputFormat::Tsv => print_tsv_topologies(&topologies),
    }

    Ok(())
}

fn print_text_topologies(generator: &TopologyGenerator, topologies: &[GeneratedTopology]) {
    println!(
        "{} topologies over {} clades ({:?} rooting)",
        topologies.len(),
        generator.clades().len(),
        generator.rooting()
    );
    println!("{}", "=".repeat(60));
    for topology in topologies {
        println!("{}  {}", topology.name, topology.newick);
    }
}

fn print_json_topologies(
    generator: &TopologyGenerator,
    topologies: &[GeneratedTopology],
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "clades": generator.clades(),
        "rooting": generator.rooting(),
        "count": topologies.len(),
        "topologies": topologies.iter().map(|t| serde_json::json!({
            "id": t.id,
            "name": t.name,
            "newick": t.newick,
            "signature": t.signature,
        })).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_topologies(topologies: &[GeneratedTopology]) {
    println!("topology_id\ttopology\tclade_newick\tsignature");
    for t in topologies {
        println!("{}\t{}\t{}\t{}", t.id, t.name, t.newick, t.signature);
    }
}
