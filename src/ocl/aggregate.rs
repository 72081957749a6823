use serde::Serialize;

use crate::blocks::BlockTable;
use crate::core::types::{OriginStability, OrthogroupId, TopologyId};
use crate::ocl::analyzer::{ClassCounts, OclResult};
use crate::utils::validation::{mean, median};

/// What is kept of one (orthogroup, topology) evaluation for aggregation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairSummary {
    pub orthogroup: OrthogroupId,
    pub topology: TopologyId,
    pub origin_block: String,
    pub origin_clade_span: String,
    pub counts: ClassCounts,
    pub expected_species: usize,
    pub present_species: usize,
    pub conservation_rate: f64,
    pub loss_rate: f64,
    pub loss_events: usize,
}

impl PairSummary {
    #[must_use]
    pub fn new(result: &OclResult, table: &BlockTable) -> Self {
        let origin = &table.blocks[result.origin];
        Self {
            orthogroup: result.orthogroup.clone(),
            topology: result.topology,
            origin_block: origin.id(),
            origin_clade_span: origin.clade_span.clone(),
            counts: result.counts,
            expected_species: result.expected_species,
            present_species: result.present_species,
            conservation_rate: result.conservation_rate,
            loss_rate: result.loss_rate,
            loss_events: result.loss_events,
        }
    }
}

/// Cross-topology summary for one orthogroup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrthogroupSummary {
    pub orthogroup: OrthogroupId,
    pub topologies_evaluated: usize,
    pub total_topologies: usize,
    /// Fraction of topologies evaluated without error
    pub coverage: f64,
    pub distinct_origin_blocks: usize,
    /// Distinct clade spans of the origin block, sorted
    pub origin_clade_spans: Vec<String>,
    pub stability: OriginStability,
    pub mean_conservation_rate: Option<f64>,
    pub median_conservation_rate: Option<f64>,
    pub mean_loss_rate: Option<f64>,
    pub median_loss_rate: Option<f64>,
    pub mean_loss_events: Option<f64>,
}

/// Summarize every evaluated topology of one orthogroup.
///
/// The origin is `stable` when it falls on the same set of clades in every
/// evaluated topology, `unstable` when it moves, and `undetermined` when no
/// topology could be evaluated.
#[must_use]
pub fn summarize_orthogroup(
    orthogroup: &OrthogroupId,
    pairs: &[PairSummary],
    total_topologies: usize,
) -> OrthogroupSummary {
    let mut origin_blocks: Vec<&str> = pairs.iter().map(|p| p.origin_block.as_str()).collect();
    origin_blocks.sort_unstable();
    origin_blocks.dedup();

    let mut spans: Vec<String> = pairs.iter().map(|p| p.origin_clade_span.clone()).collect();
    spans.sort();
    spans.dedup();

    let stability = match spans.len() {
        0 => OriginStability::Undetermined,
        1 => OriginStability::Stable,
        _ => OriginStability::Unstable,
    };

    let conservation: Vec<f64> = pairs.iter().map(|p| p.conservation_rate).collect();
    let loss: Vec<f64> = pairs.iter().map(|p| p.loss_rate).collect();
    #[allow(clippy::cast_precision_loss)]
    let loss_events: Vec<f64> = pairs.iter().map(|p| p.loss_events as f64).collect();

    #[allow(clippy::cast_precision_loss)]
    let coverage = if total_topologies == 0 {
        0.0
    } else {
        pairs.len() as f64 / total_topologies as f64
    };

    OrthogroupSummary {
        orthogroup: orthogroup.clone(),
        topologies_evaluated: pairs.len(),
        total_topologies,
        coverage,
        distinct_origin_blocks: origin_blocks.len(),
        origin_clade_spans: spans,
        stability,
        mean_conservation_rate: mean(&conservation),
        median_conservation_rate: median(&conservation),
        mean_loss_rate: mean(&loss),
        median_loss_rate: median(&loss),
        mean_loss_events: mean(&loss_events),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(topology: usize, origin: &str, span: &str, rate: f64, losses: usize) -> PairSummary {
        PairSummary {
            orthogroup: OrthogroupId::new("OG1"),
            topology: TopologyId(topology),
            origin_block: origin.to_string(),
            origin_clade_span: span.to_string(),
            counts: ClassCounts::default(),
            expected_species: 4,
            present_species: 2,
            conservation_rate: rate,
            loss_rate: 1.0 - rate,
            loss_events: losses,
        }
    }

    #[test]
    fn test_stable_origin() {
        let pairs = vec![
            pair(1, "ROOT::X+Y", "X+Y", 1.0, 0),
            pair(2, "ROOT::X+Y", "X+Y", 1.0, 0),
            pair(3, "ROOT::X+Y", "X+Y", 1.0, 0),
        ];
        let summary = summarize_orthogroup(&OrthogroupId::new("OG1"), &pairs, 3);
        assert_eq!(summary.stability, OriginStability::Stable);
        assert_eq!(summary.distinct_origin_blocks, 1);
        assert_eq!(summary.mean_conservation_rate, Some(1.0));
        assert!((summary.coverage - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unstable_origin_and_rate_statistics() {
        let pairs = vec![
            pair(1, "X+Y::X", "X", 0.5, 1),
            pair(2, "ROOT::X+Y+Z", "X+Y+Z", 0.25, 3),
            pair(3, "X+Y::X", "X", 1.0, 0),
        ];
        let summary = summarize_orthogroup(&OrthogroupId::new("OG1"), &pairs, 15);
        assert_eq!(summary.stability, OriginStability::Unstable);
        assert_eq!(summary.origin_clade_spans, vec!["X", "X+Y+Z"]);
        assert_eq!(summary.distinct_origin_blocks, 2);
        assert_eq!(summary.median_conservation_rate, Some(0.5));
        assert_eq!(summary.mean_loss_events, Some(4.0 / 3.0));
        assert!((summary.coverage - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_nothing_evaluated_is_undetermined() {
        let summary = summarize_orthogroup(&OrthogroupId::new("OG1"), &[], 3);
        assert_eq!(summary.stability, OriginStability::Undetermined);
        assert_eq!(summary.topologies_evaluated, 0);
        assert_eq!(summary.mean_conservation_rate, None);
        assert_eq!(summary.coverage, 0.0);
    }
}
