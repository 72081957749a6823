use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;

use crate::core::types::{CladeId, OrthogroupId, TopologyId};
use crate::ocl::{analyze, summarize_orthogroup, BlockStatistics, OclResult, PairSummary};
use crate::parsing::orthogroups::{parse_orthogroup_file, OrthogroupMembership};
use crate::pipeline::output::{
    format_optional_rate, format_rate, write_text_atomic, TableWriter, LIST_SEPARATOR,
};
use crate::pipeline::{AnalysisContext, PipelineConfig, PipelineError};

pub const TOPOLOGY_DIR: &str = "topologies";
pub const CLADE_TOPOLOGIES_FILE: &str = "clade_topologies.tsv";
pub const BLOCKS_FILE: &str = "blocks.tsv";
pub const OCL_FILE: &str = "ocl.tsv";
pub const OCL_PAIRS_FILE: &str = "ocl_pairs.tsv";
pub const BLOCK_STATISTICS_FILE: &str = "block_statistics.tsv";
pub const SUMMARY_FILE: &str = "summary.tsv";
pub const SKIPPED_PAIRS_FILE: &str = "skipped_pairs.tsv";
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

/// A pair that could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPair {
    pub orthogroup: OrthogroupId,
    pub topology: TopologyId,
    pub reason: &'static str,
    pub detail: String,
}

/// Every result for one orthogroup across all topologies
#[derive(Debug, Clone)]
pub struct OrthogroupEvaluation {
    pub orthogroup: OrthogroupId,
    pub results: Vec<OclResult>,
    pub skipped: Vec<SkippedPair>,
}

/// Evaluate one orthogroup against every topology of the context.
///
/// Membership errors skip the affected pairs; they never abort the run.
#[must_use]
pub fn evaluate_orthogroup(
    context: &AnalysisContext,
    membership: &OrthogroupMembership,
) -> OrthogroupEvaluation {
    let mut evaluation = OrthogroupEvaluation {
        orthogroup: membership.id.clone(),
        results: Vec::with_capacity(context.topologies.len()),
        skipped: Vec::new(),
    };

    let members = match membership.resolve(&context.assignment) {
        Ok(members) => members,
        Err(e) => {
            tracing::warn!(orthogroup = %membership.id, error = %e, "Skipping orthogroup");
            evaluation.skipped = context
                .topologies
                .iter()
                .map(|model| SkippedPair {
                    orthogroup: membership.id.clone(),
                    topology: model.generated.id,
                    reason: e.reason(),
                    detail: e.to_string(),
                })
                .collect();
            return evaluation;
        }
    };

    for model in &context.topologies {
        match analyze(&model.blocks, &membership.id, &members) {
            Ok(result) => evaluation.results.push(result),
            Err(e) => {
                tracing::warn!(
                    orthogroup = %membership.id,
                    topology = %model.generated.name,
                    error = %e,
                    "Skipping pair"
                );
                evaluation.skipped.push(SkippedPair {
                    orthogroup: membership.id.clone(),
                    topology: model.generated.id,
                    reason: e.reason(),
                    detail: e.to_string(),
                });
            }
        }
    }
    evaluation
}

/// Outcome of a pipeline run, also written as `run_summary.json`
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub output_dir: PathBuf,
    pub clades: Vec<CladeId>,
    pub species: usize,
    pub topologies_generated: usize,
    pub orthogroups: usize,
    pub pairs_evaluated: usize,
    pub pairs_skipped: usize,
    pub skip_reasons: BTreeMap<String, usize>,
    pub non_monophyletic_clades: Vec<CladeId>,
    pub outputs: Vec<PathBuf>,
}

/// Run the full pipeline described by `config`.
///
/// Inputs are loaded and validated before the output directory is created;
/// any fatal error there leaves the file system untouched.
///
/// # Errors
///
/// Returns `PipelineError` for invalid configuration, unreadable or malformed
/// inputs, assignment or grafting failures, or output IO errors.
pub fn run(config: &PipelineConfig) -> Result<RunReport, PipelineError> {
    let started_at = Utc::now();
    config.validate()?;

    let context = AnalysisContext::build(config)?;
    let orthogroups_path = config.orthogroups_path()?;
    let orthogroups = parse_orthogroup_file(orthogroups_path)
        .map_err(|e| PipelineError::parse(orthogroups_path, e))?;
    tracing::info!(orthogroups = orthogroups.len(), "Loaded orthogroup memberships");

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(num_threads) = config.num_threads {
        builder = builder.num_threads(num_threads);
    }
    let pool = builder.build()?;

    let output_dir = config.output_dir.as_path();
    std::fs::create_dir_all(output_dir.join(TOPOLOGY_DIR))?;

    let mut outputs = write_topologies(&context, output_dir)?;
    outputs.push(write_blocks(&context, output_dir)?);

    let mut ocl = if config.write_ocl_table {
        Some(TableWriter::create(
            &output_dir.join(OCL_FILE),
            &["orthogroup", "topology", "block_id", "classification"],
        )?)
    } else {
        None
    };
    let mut pairs_table = TableWriter::create(
        &output_dir.join(OCL_PAIRS_FILE),
        &[
            "orthogroup",
            "topology",
            "origin_block",
            "origin_clade_span",
            "expected_species",
            "present_species",
            "conserved_blocks",
            "lost_blocks",
            "not_applicable_blocks",
            "conservation_rate",
            "loss_rate",
            "loss_events",
        ],
    )?;
    let mut summary_table = TableWriter::create(
        &output_dir.join(SUMMARY_FILE),
        &[
            "orthogroup",
            "topologies_evaluated",
            "total_topologies",
            "coverage",
            "distinct_origin_blocks",
            "origin_clade_spans",
            "origin_stability",
            "mean_conservation_rate",
            "median_conservation_rate",
            "mean_loss_rate",
            "median_loss_rate",
            "mean_loss_events",
        ],
    )?;
    let mut skipped_table = TableWriter::create(
        &output_dir.join(SKIPPED_PAIRS_FILE),
        &["orthogroup", "topology", "reason", "detail"],
    )?;

    let block_counts: Vec<usize> = context.topologies.iter().map(|t| t.blocks.len()).collect();
    let mut statistics = BlockStatistics::new(&block_counts);
    let mut skip_reasons: BTreeMap<String, usize> = BTreeMap::new();
    let mut pairs_evaluated = 0;
    let mut pairs_skipped = 0;
    let total_topologies = context.topologies.len();

    for chunk in orthogroups.chunks(config.chunk_size) {
        let evaluations: Vec<OrthogroupEvaluation> = pool.install(|| {
            chunk
                .par_iter()
                .map(|og| evaluate_orthogroup(&context, og))
                .collect()
        });

        for evaluation in evaluations {
            let mut pairs = Vec::with_capacity(evaluation.results.len());
            for result in &evaluation.results {
                let Some(model) = context.model(result.topology) else {
                    continue;
                };
                if let Some(ocl) = ocl.as_mut() {
                    for (block, class) in model.blocks.blocks.iter().zip(&result.classes) {
                        ocl.write_row([
                            evaluation.orthogroup.as_str(),
                            model.generated.name.as_str(),
                            block.id().as_str(),
                            class.as_str(),
                        ])?;
                    }
                }
                statistics.record(result);

                let pair = PairSummary::new(result, &model.blocks);
                pairs_table.write_row([
                    pair.orthogroup.to_string(),
                    model.generated.name.clone(),
                    pair.origin_block.clone(),
                    pair.origin_clade_span.clone(),
                    pair.expected_species.to_string(),
                    pair.present_species.to_string(),
                    pair.counts.conserved.to_string(),
                    pair.counts.lost.to_string(),
                    pair.counts.not_applicable.to_string(),
                    format_rate(pair.conservation_rate),
                    format_rate(pair.loss_rate),
                    pair.loss_events.to_string(),
                ])?;
                pairs.push(pair);
            }

            for skipped in &evaluation.skipped {
                let name = context
                    .model(skipped.topology)
                    .map_or("", |m| m.generated.name.as_str());
                skipped_table.write_row([
                    skipped.orthogroup.as_str(),
                    name,
                    skipped.reason,
                    skipped.detail.as_str(),
                ])?;
                *skip_reasons.entry(skipped.reason.to_string()).or_default() += 1;
            }
            pairs_evaluated += evaluation.results.len();
            pairs_skipped += evaluation.skipped.len();

            let summary = summarize_orthogroup(&evaluation.orthogroup, &pairs, total_topologies);
            summary_table.write_row([
                summary.orthogroup.to_string(),
                summary.topologies_evaluated.to_string(),
                summary.total_topologies.to_string(),
                format_rate(summary.coverage),
                summary.distinct_origin_blocks.to_string(),
                summary.origin_clade_spans.join(";"),
                summary.stability.to_string(),
                format_optional_rate(summary.mean_conservation_rate),
                format_optional_rate(summary.median_conservation_rate),
                format_optional_rate(summary.mean_loss_rate),
                format_optional_rate(summary.median_loss_rate),
                format_optional_rate(summary.mean_loss_events),
            ])?;
        }
        tracing::debug!(orthogroups = chunk.len(), "Evaluated chunk");
    }

    if let Some(ocl) = ocl {
        outputs.push(ocl.commit()?);
    }
    outputs.push(pairs_table.commit()?);
    outputs.push(write_block_statistics(&context, &statistics, output_dir)?);
    outputs.push(summary_table.commit()?);
    outputs.push(skipped_table.commit()?);

    let mut report = RunReport {
        started_at,
        finished_at: Utc::now(),
        output_dir: output_dir.to_path_buf(),
        clades: context.assignment.clades().to_vec(),
        species: context.assignment.species_count(),
        topologies_generated: total_topologies,
        orthogroups: orthogroups.len(),
        pairs_evaluated,
        pairs_skipped,
        skip_reasons,
        non_monophyletic_clades: context.subtrees.non_monophyletic().to_vec(),
        outputs,
    };
    let summary_path = output_dir.join(RUN_SUMMARY_FILE);
    report.outputs.push(summary_path.clone());
    write_text_atomic(&summary_path, &serde_json::to_string_pretty(&report)?)?;

    tracing::info!(
        topologies = report.topologies_generated,
        pairs_evaluated = report.pairs_evaluated,
        pairs_skipped = report.pairs_skipped,
        "Run complete"
    );
    Ok(report)
}

fn write_topologies(
    context: &AnalysisContext,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut outputs = Vec::with_capacity(context.topologies.len() + 1);
    let topology_dir = output_dir.join(TOPOLOGY_DIR);

    let mut table = TableWriter::create(
        &topology_dir.join(CLADE_TOPOLOGIES_FILE),
        &["topology_id", "topology", "clade_newick", "signature"],
    )?;
    for model in &context.topologies {
        let path = topology_dir.join(format!("{}.newick", model.generated.name));
        outputs.push(write_text_atomic(&path, &format!("{}\n", model.tree.to_newick()))?);
        table.write_row([
            model.generated.id.to_string(),
            model.generated.name.clone(),
            model.generated.newick.clone(),
            model.generated.signature.clone(),
        ])?;
    }
    outputs.push(table.commit()?);
    Ok(outputs)
}

fn write_blocks(context: &AnalysisContext, output_dir: &Path) -> Result<PathBuf, PipelineError> {
    let mut table = TableWriter::create(
        &output_dir.join(BLOCKS_FILE),
        &[
            "topology",
            "block_index",
            "block_id",
            "parent",
            "child",
            "depth",
            "terminal",
            "clade_span",
            "descendant_count",
            "descendant_species",
        ],
    )?;
    for model in &context.topologies {
        for block in &model.blocks.blocks {
            let species: Vec<&str> = block
                .descendants
                .iter()
                .filter_map(|i| context.assignment.species_name(i))
                .collect();
            table.write_row([
                model.generated.name.clone(),
                block.index.to_string(),
                block.id(),
                block.parent_label.clone(),
                block.child_label.clone(),
                block.depth.to_string(),
                block.is_terminal.to_string(),
                block.clade_span.clone(),
                block.descendants.len().to_string(),
                species.join(LIST_SEPARATOR),
            ])?;
        }
    }
    Ok(table.commit()?)
}

fn write_block_statistics(
    context: &AnalysisContext,
    statistics: &BlockStatistics,
    output_dir: &Path,
) -> Result<PathBuf, PipelineError> {
    let mut table = TableWriter::create(
        &output_dir.join(BLOCK_STATISTICS_FILE),
        &[
            "topology",
            "block_id",
            "origin",
            "conserved",
            "lost",
            "not_applicable",
            "conservation_rate",
        ],
    )?;
    for model in &context.topologies {
        for block in &model.blocks.blocks {
            let Some(counts) = statistics.get(model.generated.id, block.index) else {
                continue;
            };
            table.write_row([
                model.generated.name.clone(),
                block.id(),
                counts.origin.to_string(),
                counts.conserved.to_string(),
                counts.lost.to_string(),
                counts.not_applicable.to_string(),
                format_optional_rate(BlockStatistics::conservation_rate(counts)),
            ])?;
        }
    }
    Ok(table.commit()?)
}
