use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::types::{CladeId, RootingConvention};
use crate::pipeline::{self, PipelineConfig, RunReport};

#[derive(Args)]
pub struct RunArgs {
    /// Species-to-clade assignment table (species<TAB>clade)
    #[arg(short, long)]
    pub assignments: Option<PathBuf>,

    /// Reference species tree in Newick format
    #[arg(short, long)]
    pub tree: Option<PathBuf>,

    /// Orthogroup membership table (orthogroup<TAB>member...)
    #[arg(short = 'g', long)]
    pub orthogroups: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON config file; command-line flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Comma-separated clade order (defaults to assignment table order)
    #[arg(long, value_delimiter = ',')]
    pub clade_order: Vec<String>,

    /// Outgroup clade, placed first in canonical topologies
    #[arg(long)]
    pub outgroup: Option<String>,

    /// Rooting convention for topology enumeration
    #[arg(long, value_enum)]
    pub rooting: Option<RootingConvention>,

    /// Worker threads for pair evaluation (default: all cores)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Orthogroups evaluated per parallel chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Skip writing the per-block ocl.tsv table
    #[arg(long)]
    pub no_ocl_table: bool,
}

impl RunArgs {
    /// Merge flags over the config file (or defaults)
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded.
    pub fn to_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load_from_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(path) = &self.assignments {
            config.assignments = Some(path.clone());
        }
        if let Some(path) = &self.tree {
            config.reference_tree = Some(path.clone());
        }
        if let Some(path) = &self.orthogroups {
            config.orthogroups = Some(path.clone());
        }
        if let Some(path) = &self.output {
            config.output_dir = path.clone();
        }
        if !self.clade_order.is_empty() {
            config.clade_order = self.clade_order.iter().map(CladeId::new).collect();
        }
        if let Some(outgroup) = &self.outgroup {
            config.outgroup = Some(CladeId::new(outgroup.clone()));
        }
        if let Some(rooting) = self.rooting {
            config.rooting = rooting;
        }
        if let Some(threads) = self.threads {
            config.num_threads = Some(threads);
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if self.no_ocl_table {
            config.write_ocl_table = false;
        }
        Ok(config)
    }
}

/// Execute run subcommand
///
/// # Errors
///
/// Returns an error if the configuration is invalid, inputs cannot be
/// loaded, or outputs cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: RunArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.to_config()?;
    if verbose {
        eprintln!("Configuration:\n{}", config.to_json());
    }

    let report = pipeline::run(&config)?;

    match format {
        OutputFormat::Text => print_text_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Tsv => print_tsv_report(&report),
    }

    Ok(())
}

fn print_text_report(report: &RunReport) {
    println!("Run Summary");
    println!("{}", "=".repeat(60));
    println!(
        "Clades: {}",
        report
            .clades
            .iter()
            .map(CladeId::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Species: {}", report.species);
    println!("Topologies generated: {}", report.topologies_generated);
    println!("Orthogroups: {}", report.orthogroups);
    println!("Pairs evaluated: {}", report.pairs_evaluated);
    println!("Pairs skipped: {}", report.pairs_skipped);
    for (reason, count) in &report.skip_reasons {
        println!("  {reason}: {count}");
    }
    if !report.non_monophyletic_clades.is_empty() {
        println!(
            "Non-monophyletic clades in reference: {}",
            report
                .non_monophyletic_clades
                .iter()
                .map(CladeId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    println!("\nOutputs in {}:", report.output_dir.display());
    for path in &report.outputs {
        println!("  {}", path.display());
    }
}

fn print_tsv_report(report: &RunReport) {
    println!("metric\tvalue");
    println!("topologies_generated\t{}", report.topologies_generated);
    println!("orthogroups\t{}", report.orthogroups);
    println!("pairs_evaluated\t{}", report.pairs_evaluated);
    println!("pairs_skipped\t{}", report.pairs_skipped);
    for (reason, count) in &report.skip_reasons {
        println!("skipped_{reason}\t{count}");
    }
    println!("output_dir\t{}", report.output_dir.display());
}
