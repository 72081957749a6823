use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Args;

use crate::cli::OutputFormat;
use crate::core::types::{CladeId, RootingConvention};
use crate::ocl::{summarize_orthogroup, PairSummary};
use crate::parsing::orthogroups::parse_orthogroup_file;
use crate::pipeline::runner::{evaluate_orthogroup, OrthogroupEvaluation};
use crate::pipeline::{AnalysisContext, PipelineConfig};

#[derive(Args)]
pub struct InspectArgs {
    /// Orthogroup to inspect
    #[arg(required = true)]
    pub orthogroup: String,

    /// Species-to-clade assignment table
    #[arg(short, long, required = true)]
    pub assignments: PathBuf,

    /// Reference species tree in Newick format
    #[arg(short, long, required = true)]
    pub tree: PathBuf,

    /// Orthogroup membership table
    #[arg(short = 'g', long, required = true)]
    pub orthogroups: PathBuf,

    /// Comma-separated clade order
    #[arg(long, value_delimiter = ',')]
    pub clade_order: Vec<String>,

    /// Outgroup clade
    #[arg(long)]
    pub outgroup: Option<String>,

    /// Rooting convention for topology enumeration
    #[arg(long, value_enum, default_value = "anchor")]
    pub rooting: RootingConvention,
}

/// Execute inspect subcommand: classify one orthogroup on every topology
/// and print the result without writing any files
///
/// # Errors
///
/// Returns an error if inputs cannot be loaded or the orthogroup is unknown.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: InspectArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = PipelineConfig {
        assignments: Some(args.assignments.clone()),
        reference_tree: Some(args.tree.clone()),
        orthogroups: Some(args.orthogroups.clone()),
        clade_order: args.clade_order.iter().map(CladeId::new).collect(),
        outgroup: args.outgroup.as_ref().map(CladeId::new),
        rooting: args.rooting,
        ..Default::default()
    };
    let context = AnalysisContext::build(&config)?;

    let memberships = parse_orthogroup_file(&args.orthogroups)
        .with_context(|| format!("Failed to read {}", args.orthogroups.display()))?;
    let membership = memberships
        .iter()
        .find(|m| m.id.as_str() == args.orthogroup)
        .ok_or_else(|| anyhow!("Orthogroup '{}' not found", args.orthogroup))?;

    if verbose {
        eprintln!(
            "Orthogroup {} has {} species; evaluating {} topologies",
            membership.id,
            membership.species.len(),
            context.topologies.len()
        );
    }

    let evaluation = evaluate_orthogroup(&context, membership);

    match format {
        OutputFormat::Text => print_text_inspection(&context, &evaluation, verbose),
        OutputFormat::Json => print_json_inspection(&context, &evaluation)?,
        OutputFormat::Tsv => print_tsv_inspection(&context, &evaluation),
    }

    Ok(())
}

fn pair_summaries(
    context: &AnalysisContext,
    evaluation: &OrthogroupEvaluation,
) -> Vec<PairSummary> {
    evaluation
        .results
        .iter()
        .filter_map(|r| context.model(r.topology).map(|m| PairSummary::new(r, &m.blocks)))
        .collect()
}

fn print_text_inspection(
    context: &AnalysisContext,
    evaluation: &OrthogroupEvaluation,
    verbose: bool,
) {
    let pairs = pair_summaries(context, evaluation);
    let summary = summarize_orthogroup(&evaluation.orthogroup, &pairs, context.topologies.len());

    println!("Orthogroup {}", evaluation.orthogroup);
    println!("{}", "=".repeat(60));
    println!("Origin stability: {}", summary.stability);
    println!(
        "Topologies evaluated: {}/{}",
        summary.topologies_evaluated, summary.total_topologies
    );

    for (result, pair) in evaluation.results.iter().zip(&pairs) {
        let Some(model) = context.model(result.topology) else {
            continue;
        };
        println!("\n{}  {}", model.generated.name, model.generated.newick);
        println!("  Origin: {} ({})", pair.origin_block, pair.origin_clade_span);
        println!(
            "  Conservation: {:.1}%  Loss: {:.1}%  Loss events: {}",
            pair.conservation_rate * 100.0,
            pair.loss_rate * 100.0,
            pair.loss_events
        );
        if verbose {
            for (block, class) in model.blocks.blocks.iter().zip(&result.classes) {
                println!("    {:<16} {}", class.as_str(), block.id());
            }
        }
    }

    for skipped in &evaluation.skipped {
        println!("\nSkipped topology {}: {}", skipped.topology, skipped.detail);
    }
}

fn print_json_inspection(
    context: &AnalysisContext,
    evaluation: &OrthogroupEvaluation,
) -> anyhow::Result<()> {
    let pairs = pair_summaries(context, evaluation);
    let summary = summarize_orthogroup(&evaluation.orthogroup, &pairs, context.topologies.len());

    let topologies: Vec<serde_json::Value> = evaluation
        .results
        .iter()
        .zip(&pairs)
        .filter_map(|(result, pair)| {
            let model = context.model(result.topology)?;
            Some(serde_json::json!({
                "topology": model.generated.name,
                "clade_newick": model.generated.newick,
                "pair": pair,
                "blocks": model.blocks.blocks.iter().zip(&result.classes).map(|(b, c)| {
                    serde_json::json!({ "block_id": b.id(), "classification": c })
                }).collect::<Vec<_>>(),
            }))
        })
        .collect();

    let output = serde_json::json!({
        "summary": summary,
        "topologies": topologies,
        "skipped": evaluation.skipped,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_inspection(context: &AnalysisContext, evaluation: &OrthogroupEvaluation) {
    println!("orthogroup\ttopology\tblock_id\tclassification");
    for result in &evaluation.results {
        let Some(model) = context.model(result.topology) else {
            continue;
        };
        for (block, class) in model.blocks.blocks.iter().zip(&result.classes) {
            println!(
                "{}\t{}\t{}\t{}",
                evaluation.orthogroup,
                model.generated.name,
                block.id(),
                class
            );
        }
    }
}
