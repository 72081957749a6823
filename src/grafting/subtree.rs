use std::collections::{BTreeMap, HashSet};

use crate::core::clade::{AssignmentError, CladeAssignment};
use crate::core::tree::SpeciesTree;
use crate::core::types::CladeId;
use crate::grafting::{GraftError, StructuralError};

/// One species-level subtree per clade, cut from the reference tree
#[derive(Debug, Clone)]
pub struct CladeSubtrees {
    subtrees: BTreeMap<CladeId, SpeciesTree>,
    non_monophyletic: Vec<CladeId>,
}

impl CladeSubtrees {
    /// Restrict the reference tree to each clade's species.
    ///
    /// The subtree root is labelled with the clade id and the other internal
    /// nodes `<clade>_<k>` in preorder, skipping numbers taken by species. A single-species clade is just that
    /// species' leaf. Clades that are not monophyletic in the reference tree
    /// are logged and still restricted.
    ///
    /// # Errors
    ///
    /// Returns `StructuralError` for unlabelled or repeated reference leaves,
    /// and `AssignmentError` when a reference leaf has no clade or an assigned
    /// species is absent from the reference tree.
    pub fn derive(
        reference: &SpeciesTree,
        assignment: &CladeAssignment,
    ) -> Result<Self, GraftError> {
        let mut leaf_labels: HashSet<&str> = HashSet::new();
        for leaf in reference.leaves() {
            let label = reference
                .node(leaf)
                .label
                .as_deref()
                .ok_or(StructuralError::UnlabeledNode("leaf"))?;
            if !leaf_labels.insert(label) {
                return Err(StructuralError::DuplicateLeaf(label.to_string()).into());
            }
            if assignment.species_index(label).is_none() {
                return Err(AssignmentError::Unassigned(label.to_string()).into());
            }
        }
        for species in assignment.species() {
            if !leaf_labels.contains(species.as_str()) {
                return Err(AssignmentError::MissingFromReference(species.clone()).into());
            }
        }

        let mut subtrees = BTreeMap::new();
        let mut non_monophyletic = Vec::new();

        for clade in assignment.clades() {
            let members = assignment.members(clade);
            let keep: HashSet<&str> = members.iter().copied().collect();
            let mut subtree = reference
                .restrict(&keep)
                .ok_or_else(|| StructuralError::EmptySubtree(clade.clone()))?;

            let member_nodes: Vec<_> = members
                .iter()
                .filter_map(|m| reference.find_leaf(m))
                .collect();
            if let Some(mrca) = reference.mrca(&member_nodes) {
                let below = reference.leaf_count_below(mrca);
                if below != members.len() {
                    tracing::warn!(
                        clade = %clade,
                        members = members.len(),
                        leaves_under_mrca = below,
                        "Clade is not monophyletic in the reference tree"
                    );
                    non_monophyletic.push(clade.clone());
                }
            }

            relabel(&mut subtree, clade, assignment);
            tracing::debug!(clade = %clade, nodes = subtree.len(), "Derived clade subtree");
            subtrees.insert(clade.clone(), subtree);
        }

        Ok(Self {
            subtrees,
            non_monophyletic,
        })
    }

    #[must_use]
    pub fn get(&self, clade: &CladeId) -> Option<&SpeciesTree> {
        self.subtrees.get(clade)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subtrees.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subtrees.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CladeId, &SpeciesTree)> {
        self.subtrees.iter()
    }

    /// Clades whose species do not form a clade in the reference tree
    #[must_use]
    pub fn non_monophyletic(&self) -> &[CladeId] {
        &self.non_monophyletic
    }
}

/// Internal names skip any `<clade>_<k>` that is already a species id.
fn relabel(subtree: &mut SpeciesTree, clade: &CladeId, assignment: &CladeAssignment) {
    let root = subtree.root();
    if subtree.is_leaf(root) {
        return;
    }
    let mut k = 0;
    for index in subtree.preorder() {
        if subtree.is_leaf(index) {
            continue;
        }
        let label = if index == root {
            clade.to_string()
        } else {
            loop {
                k += 1;
                let candidate = format!("{clade}_{k}");
                if assignment.species_index(&candidate).is_none() {
                    break candidate;
                }
            }
        };
        subtree.node_mut(index).label = Some(label);
    }
}
