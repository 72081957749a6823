use std::collections::HashSet;

use crate::core::clade::CladeAssignment;
use crate::core::topology::Topology;
use crate::core::tree::{NodeIndex, SpeciesTree};
use crate::core::types::CladeId;
use crate::grafting::{CladeSubtrees, GraftError, StructuralError};
use crate::topology::GeneratedTopology;

/// Builds full species trees from clade topologies
#[derive(Debug, Clone, Copy)]
pub struct Grafter<'a> {
    subtrees: &'a CladeSubtrees,
    assignment: &'a CladeAssignment,
}

impl<'a> Grafter<'a> {
    #[must_use]
    pub fn new(subtrees: &'a CladeSubtrees, assignment: &'a CladeAssignment) -> Self {
        Self {
            subtrees,
            assignment,
        }
    }

    /// Replace every clade leaf of `generated` with its species subtree.
    ///
    /// Each split becomes an internal node labelled with the clades below it,
    /// joined by `+` in configured clade order.
    ///
    /// # Errors
    ///
    /// Returns `StructuralError` when a clade has no subtree or appears twice,
    /// a subtree is empty, or the grafted tree's leaves or labels are not
    /// exactly the master species list without repeats.
    pub fn graft(&self, generated: &GeneratedTopology) -> Result<SpeciesTree, GraftError> {
        let mut attached: HashSet<&CladeId> = HashSet::new();

        let mut tree = match &generated.topology {
            Topology::Leaf(clade) => self.attachment(clade, &mut attached)?.clone(),
            Topology::Split(left, right) => {
                let mut tree =
                    SpeciesTree::new(Some(self.split_label(&generated.topology)), None);
                let root = tree.root();
                let mut stack: Vec<(&Topology, NodeIndex)> =
                    vec![(right.as_ref(), root), (left.as_ref(), root)];

                while let Some((node, parent)) = stack.pop() {
                    match node {
                        Topology::Leaf(clade) => {
                            let subtree = self.attachment(clade, &mut attached)?;
                            tree.append_subtree(parent, subtree);
                        }
                        Topology::Split(left, right) => {
                            let index = tree.add_child(parent, Some(self.split_label(node)), None);
                            stack.push((right.as_ref(), index));
                            stack.push((left.as_ref(), index));
                        }
                    }
                }
                tree
            }
        };
        tree.node_mut(tree.root()).branch_length = None;
        self.validate(&tree)?;

        tracing::debug!(
            topology = %generated.name,
            nodes = tree.len(),
            "Grafted species tree"
        );
        Ok(tree)
    }

    fn attachment<'t>(
        &self,
        clade: &'t CladeId,
        attached: &mut HashSet<&'t CladeId>,
    ) -> Result<&'a SpeciesTree, StructuralError> {
        if !attached.insert(clade) {
            return Err(StructuralError::DuplicateAttachment(clade.clone()));
        }
        self.subtrees
            .get(clade)
            .ok_or_else(|| StructuralError::MissingAttachment(clade.clone()))
    }

    fn split_label(&self, node: &Topology) -> String {
        let mut clades = node.leaves();
        clades.sort_by_key(|c| {
            (
                self.assignment.clade_rank(c).unwrap_or(usize::MAX),
                (*c).clone(),
            )
        });
        clades
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join("+")
    }

    fn validate(&self, tree: &SpeciesTree) -> Result<(), StructuralError> {
        let mut labels: HashSet<&str> = HashSet::with_capacity(tree.len());
        for node in tree.nodes() {
            let label = node.label.as_deref().ok_or(StructuralError::UnlabeledNode(
                if node.is_leaf() { "leaf" } else { "internal" },
            ))?;
            if !labels.insert(label) {
                return Err(StructuralError::DuplicateLabel(label.to_string()));
            }
        }

        let mut leaves = tree.leaf_labels();
        leaves.sort_unstable();
        let expected = self.assignment.species();
        if leaves.len() != expected.len() || leaves.iter().zip(expected).any(|(a, b)| *a != b) {
            return Err(StructuralError::LeafSetMismatch {
                expected: expected.len(),
                found: leaves.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clade::AssignmentRow;
    use crate::core::types::{RootingConvention, TopologyId};
    use crate::parsing::newick::parse_newick;
    use crate::topology::TopologyGenerator;

    fn setup(reference: &str, rows: &[(&str, &str)]) -> (CladeAssignment, CladeSubtrees) {
        let rows: Vec<AssignmentRow> = rows
            .iter()
            .map(|(s, c)| AssignmentRow::new(*s, *c))
            .collect();
        let assignment = CladeAssignment::from_rows(&rows).unwrap();
        let reference = parse_newick(reference).unwrap();
        let subtrees = CladeSubtrees::derive(&reference, &assignment).unwrap();
        (assignment, subtrees)
    }

    fn generated(topology: Topology) -> GeneratedTopology {
        GeneratedTopology {
            id: TopologyId(1),
            name: "topology_001".to_string(),
            newick: topology.to_newick(),
            signature: String::new(),
            topology,
        }
    }

    #[test]
    fn test_graft_demo_topologies() {
        let (assignment, subtrees) = setup(
            "((Homo_sapiens,Octopus_bimaculoides),Crassostrea_gigas);",
            &[
                ("Homo_sapiens", "Vertebrata"),
                ("Octopus_bimaculoides", "Mollusca"),
                ("Crassostrea_gigas", "Outgroup"),
            ],
        );
        let generator = TopologyGenerator::new(
            assignment.clades(),
            RootingConvention::Anchor,
            None,
        )
        .unwrap();
        let grafter = Grafter::new(&subtrees, &assignment);

        for topology in generator.generate() {
            let tree = grafter.graft(&topology).unwrap();
            assert_eq!(tree.len(), 5);
            let mut leaves = tree.leaf_labels();
            leaves.sort_unstable();
            assert_eq!(leaves, assignment.species());
            assert_eq!(tree.label(tree.root()), "Vertebrata+Mollusca+Outgroup");
        }
    }

    #[test]
    fn test_graft_multi_species_clades() {
        let (assignment, subtrees) = setup(
            "((A:1,B:1):1,((C:1,D:1):1,E:2):1);",
            &[("A", "X"), ("B", "X"), ("C", "Y"), ("D", "Y"), ("E", "Z")],
        );
        let grafter = Grafter::new(&subtrees, &assignment);
        let topology = Topology::join(
            Topology::leaf("X"),
            Topology::join(Topology::leaf("Y"), Topology::leaf("Z")),
        );
        let tree = grafter.graft(&generated(topology)).unwrap();
        assert_eq!(tree.to_newick(), "((A:1,B:1)X,((C:1,D:1)Y,E)Y+Z)X+Y+Z;");
    }

    #[test]
    fn test_missing_and_duplicate_attachments() {
        let (assignment, subtrees) = setup("(A,B);", &[("A", "X"), ("B", "Y")]);
        let grafter = Grafter::new(&subtrees, &assignment);

        let missing = Topology::join(Topology::leaf("X"), Topology::leaf("Q"));
        assert!(matches!(
            grafter.graft(&generated(missing)),
            Err(GraftError::Structural(StructuralError::MissingAttachment(_)))
        ));

        let twice = Topology::join(Topology::leaf("X"), Topology::leaf("X"));
        assert!(matches!(
            grafter.graft(&generated(twice)),
            Err(GraftError::Structural(StructuralError::DuplicateAttachment(_)))
        ));

        let partial = Topology::join(
            Topology::leaf("X"),
            Topology::join(Topology::leaf("Y"), Topology::leaf("X")),
        );
        assert!(grafter.graft(&generated(partial)).is_err());
    }

    #[test]
    fn test_single_clade_topology_is_its_subtree() {
        let (assignment, subtrees) = setup(
            "((A:1,B:1):2,C:1);",
            &[("A", "X"), ("B", "X"), ("C", "X")],
        );
        let grafter = Grafter::new(&subtrees, &assignment);
        let tree = grafter.graft(&generated(Topology::leaf("X"))).unwrap();
        assert_eq!(tree.to_newick(), "((A:1,B:1)X_1:2,C:1)X;");
    }

    #[test]
    fn test_incomplete_topology_is_a_leaf_set_mismatch() {
        let (assignment, subtrees) = setup(
            "((A,B),C);",
            &[("A", "X"), ("B", "Y"), ("C", "Z")],
        );
        let grafter = Grafter::new(&subtrees, &assignment);
        let topology = Topology::join(Topology::leaf("X"), Topology::leaf("Y"));
        assert!(matches!(
            grafter.graft(&generated(topology)),
            Err(GraftError::Structural(StructuralError::LeafSetMismatch {
                expected: 3,
                found: 2
            }))
        ));
    }
}
