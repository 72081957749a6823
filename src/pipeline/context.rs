use crate::blocks::{extract_blocks, BlockTable};
use crate::core::clade::CladeAssignment;
use crate::core::tree::SpeciesTree;
use crate::core::types::{CladeId, RootingConvention, TopologyId};
use crate::grafting::{CladeSubtrees, Grafter};
use crate::parsing::assignments::parse_assignment_file;
use crate::parsing::newick::parse_newick_file;
use crate::pipeline::{PipelineConfig, PipelineError};
use crate::topology::{GeneratedTopology, TopologyGenerator};

/// One topology with its grafted species tree and block table
#[derive(Debug, Clone)]
pub struct TopologyModel {
    pub generated: GeneratedTopology,
    pub tree: SpeciesTree,
    pub blocks: BlockTable,
}

/// Everything pair evaluation reads, built once and shared by reference
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub assignment: CladeAssignment,
    pub subtrees: CladeSubtrees,
    pub rooting: RootingConvention,
    pub topologies: Vec<TopologyModel>,
}

impl AnalysisContext {
    /// Load the assignment table and reference tree named in `config`, then
    /// generate, graft and decompose every topology.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` for missing inputs, unreadable or malformed
    /// files, assignment or configuration problems, or grafting failures.
    pub fn build(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let assignments_path = config.assignments_path()?;
        let rows = parse_assignment_file(assignments_path)
            .map_err(|e| PipelineError::parse(assignments_path, e))?;
        let mut assignment = CladeAssignment::from_rows(&rows)?;
        if !config.clade_order.is_empty() {
            assignment = assignment.with_clade_order(&config.clade_order)?;
        }
        tracing::info!(
            species = assignment.species_count(),
            clades = assignment.clades().len(),
            "Loaded clade assignments"
        );

        let tree_path = config.reference_tree_path()?;
        let reference =
            parse_newick_file(tree_path).map_err(|e| PipelineError::parse(tree_path, e))?;
        tracing::info!(nodes = reference.len(), "Loaded reference tree");

        Self::from_parts(assignment, &reference, config.rooting, config.outgroup.clone())
    }

    /// Build the context from already loaded inputs
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` for configuration, assignment or grafting
    /// failures.
    pub fn from_parts(
        assignment: CladeAssignment,
        reference: &SpeciesTree,
        rooting: RootingConvention,
        outgroup: Option<CladeId>,
    ) -> Result<Self, PipelineError> {
        let subtrees = CladeSubtrees::derive(reference, &assignment)?;
        let generator = TopologyGenerator::new(assignment.clades(), rooting, outgroup)?;

        let grafter = Grafter::new(&subtrees, &assignment);
        let mut topologies = Vec::new();
        for generated in generator.generate() {
            let tree = grafter.graft(&generated)?;
            let blocks = extract_blocks(&tree, &assignment, generated.id)?;
            topologies.push(TopologyModel {
                generated,
                tree,
                blocks,
            });
        }

        Ok(Self {
            assignment,
            subtrees,
            rooting,
            topologies,
        })
    }

    /// The topology model with the given id
    #[must_use]
    pub fn model(&self, id: TopologyId) -> Option<&TopologyModel> {
        self.topologies.get(id.0.checked_sub(1)?)
    }

    /// Total blocks over all topologies
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.topologies.iter().map(|t| t.blocks.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clade::AssignmentRow;
    use crate::parsing::newick::parse_newick;

    #[test]
    fn test_from_parts_builds_every_topology() {
        let assignment = CladeAssignment::from_rows(&[
            AssignmentRow::new("A", "X"),
            AssignmentRow::new("B", "X"),
            AssignmentRow::new("C", "Y"),
            AssignmentRow::new("D", "Z"),
            AssignmentRow::new("E", "W"),
        ])
        .unwrap();
        let reference = parse_newick("(((A,B),C),(D,E));").unwrap();
        let context =
            AnalysisContext::from_parts(assignment, &reference, RootingConvention::Anchor, None)
                .unwrap();

        assert_eq!(context.topologies.len(), 15);
        for model in &context.topologies {
            assert_eq!(model.blocks.len(), model.tree.len());
            assert_eq!(model.blocks.topology, model.generated.id);
            // Five leaves, three clade joins and the root of clade X
            assert_eq!(model.tree.len(), 9);
        }
        assert_eq!(context.block_count(), 15 * 9);
        assert_eq!(
            context.model(TopologyId(15)).map(|m| m.generated.name.as_str()),
            Some("topology_015")
        );
        assert!(context.model(TopologyId(0)).is_none());
        assert!(context.model(TopologyId(16)).is_none());
    }

    #[test]
    fn test_build_reports_missing_input() {
        let config = PipelineConfig::default();
        assert!(matches!(
            AnalysisContext::build(&config),
            Err(PipelineError::Configuration(_))
        ));
    }
}
