use serde::Serialize;
use thiserror::Error;

use crate::blocks::BlockTable;
use crate::core::species_set::SpeciesSet;
use crate::core::types::{OclClass, OrthogroupId, TopologyId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MembershipError {
    #[error("Orthogroup '{orthogroup}' contains species '{species}' which is not in the master species list")]
    UnknownSpecies {
        orthogroup: OrthogroupId,
        species: String,
    },

    #[error("Orthogroup '{0}' has no member species")]
    EmptySpeciesSet(OrthogroupId),

    #[error("Species of orthogroup '{0}' are not all below the tree root")]
    OutsideTree(OrthogroupId),
}

impl MembershipError {
    /// Short machine-readable reason for skip tables
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnknownSpecies { .. } => "unknown_species",
            Self::EmptySpeciesSet(_) => "empty_species_set",
            Self::OutsideTree(_) => "outside_tree",
        }
    }
}

/// Number of blocks in each OCL class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassCounts {
    pub origin: usize,
    pub conserved: usize,
    pub lost: usize,
    pub not_applicable: usize,
}

impl ClassCounts {
    pub fn add(&mut self, class: OclClass) {
        match class {
            OclClass::Origin => self.origin += 1,
            OclClass::Conserved => self.conserved += 1,
            OclClass::Lost => self.lost += 1,
            OclClass::NotApplicable => self.not_applicable += 1,
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.origin += other.origin;
        self.conserved += other.conserved;
        self.lost += other.lost;
        self.not_applicable += other.not_applicable;
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.origin + self.conserved + self.lost + self.not_applicable
    }
}

/// Classification of every block of one topology for one orthogroup
#[derive(Debug, Clone, PartialEq)]
pub struct OclResult {
    pub orthogroup: OrthogroupId,
    pub topology: TopologyId,
    /// Index of the origin block in the block table
    pub origin: usize,
    /// One class per block, in block table order
    pub classes: Vec<OclClass>,
    pub counts: ClassCounts,
    /// Species below the origin block
    pub expected_species: usize,
    /// Species of the orthogroup (terminal blocks carrying it)
    pub present_species: usize,
    pub conservation_rate: f64,
    pub loss_rate: f64,
    /// Number of `lost` blocks
    pub loss_events: usize,
}

/// Classify every block of `table` for an orthogroup with species `members`.
///
/// The origin is the block with the smallest descendant set containing every
/// member, the deepest one on ties. Below the origin a block is conserved
/// while its species intersect the orthogroup; the first block on a path that
/// does not is lost, and everything below a loss or outside the origin
/// subtree is not applicable.
///
/// # Errors
///
/// Returns `MembershipError::EmptySpeciesSet` when `members` is empty, or
/// `MembershipError::OutsideTree` when no block holds every member.
pub fn analyze(
    table: &BlockTable,
    orthogroup: &OrthogroupId,
    members: &SpeciesSet,
) -> Result<OclResult, MembershipError> {
    if members.is_empty() {
        return Err(MembershipError::EmptySpeciesSet(orthogroup.clone()));
    }

    let origin = table
        .blocks
        .iter()
        .filter(|b| members.is_subset(&b.descendants))
        .min_by(|a, b| {
            a.descendants
                .len()
                .cmp(&b.descendants.len())
                .then(b.depth.cmp(&a.depth))
        })
        .map(|b| b.index)
        .ok_or_else(|| MembershipError::OutsideTree(orthogroup.clone()))?;

    let mut classes = vec![OclClass::NotApplicable; table.len()];
    classes[origin] = OclClass::Origin;

    let mut stack: Vec<usize> = table.blocks[origin].children.clone();
    while let Some(index) = stack.pop() {
        let block = &table.blocks[index];
        if block.descendants.intersects(members) {
            classes[index] = OclClass::Conserved;
            stack.extend(&block.children);
        } else {
            classes[index] = OclClass::Lost;
        }
    }

    let mut counts = ClassCounts::default();
    for &class in &classes {
        counts.add(class);
    }

    let expected_species = table.blocks[origin].descendants.len();
    let present_species = table.blocks[origin].descendants.intersection_count(members);
    #[allow(clippy::cast_precision_loss)] // species counts are far below 2^52
    let conservation_rate = present_species as f64 / expected_species as f64;

    Ok(OclResult {
        orthogroup: orthogroup.clone(),
        topology: table.topology,
        origin,
        classes,
        counts,
        expected_species,
        present_species,
        conservation_rate,
        loss_rate: 1.0 - conservation_rate,
        loss_events: counts.lost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::extract_blocks;
    use crate::core::clade::{AssignmentRow, CladeAssignment};
    use crate::parsing::newick::parse_newick;

    fn table(newick: &str, rows: &[(&str, &str)]) -> (BlockTable, CladeAssignment) {
        let rows: Vec<AssignmentRow> = rows
            .iter()
            .map(|(s, c)| AssignmentRow::new(*s, *c))
            .collect();
        let assignment = CladeAssignment::from_rows(&rows).unwrap();
        let tree = parse_newick(newick).unwrap();
        let table = extract_blocks(&tree, &assignment, TopologyId(1)).unwrap();
        (table, assignment)
    }

    fn members(assignment: &CladeAssignment, names: &[&str]) -> SpeciesSet {
        SpeciesSet::from_indices(
            assignment.species_count(),
            names.iter().map(|n| assignment.species_index(n).unwrap()),
        )
    }

    fn five_species() -> (BlockTable, CladeAssignment) {
        table(
            "(((A,B)ab,C)abc,(D,E)de)all;",
            &[("A", "X"), ("B", "X"), ("C", "X"), ("D", "Y"), ("E", "Y")],
        )
    }

    #[test]
    fn test_full_membership_originates_at_root() {
        let (table, assignment) = five_species();
        let og = OrthogroupId::new("OG1");
        let result = analyze(&table, &og, &members(&assignment, &["A", "B", "C", "D", "E"])).unwrap();
        assert_eq!(result.origin, 0);
        assert_eq!(table.blocks[result.origin].id(), "ROOT::all");
        assert_eq!(result.counts.origin, 1);
        assert_eq!(result.counts.conserved, table.len() - 1);
        assert_eq!(result.counts.lost, 0);
        assert!((result.conservation_rate - 1.0).abs() < 1e-12);
        assert_eq!(result.loss_events, 0);
    }

    #[test]
    fn test_single_species_originates_at_leaf() {
        let (table, assignment) = five_species();
        let og = OrthogroupId::new("OG2");
        let result = analyze(&table, &og, &members(&assignment, &["C"])).unwrap();
        assert_eq!(table.blocks[result.origin].id(), "abc::C");
        assert_eq!(result.counts.origin, 1);
        assert_eq!(result.counts.conserved, 0);
        assert_eq!(result.counts.lost, 0);
        assert_eq!(result.counts.not_applicable, table.len() - 1);
        assert!((result.conservation_rate - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_losses_stop_at_first_absent_block() {
        let (table, assignment) = five_species();
        let og = OrthogroupId::new("OG3");
        // A and D: origin at the root, ab conserved, B lost, C lost, E lost
        let result = analyze(&table, &og, &members(&assignment, &["A", "D"])).unwrap();
        assert_eq!(result.origin, 0);
        let class_of = |id: &str| result.classes[table.find(id).unwrap().index];
        assert_eq!(class_of("all::abc"), OclClass::Conserved);
        assert_eq!(class_of("abc::ab"), OclClass::Conserved);
        assert_eq!(class_of("ab::A"), OclClass::Conserved);
        assert_eq!(class_of("ab::B"), OclClass::Lost);
        assert_eq!(class_of("abc::C"), OclClass::Lost);
        assert_eq!(class_of("de::E"), OclClass::Lost);
        assert_eq!(result.loss_events, 3);
        assert!((result.conservation_rate - 0.4).abs() < 1e-12);
        assert!((result.loss_rate - 0.6).abs() < 1e-12);
        assert_eq!(result.counts.total(), table.len());
    }

    #[test]
    fn test_blocks_below_a_loss_are_not_applicable() {
        let (table, assignment) = five_species();
        let og = OrthogroupId::new("OG4");
        let result = analyze(&table, &og, &members(&assignment, &["C", "D"])).unwrap();
        assert_eq!(result.origin, 0);
        let class_of = |id: &str| result.classes[table.find(id).unwrap().index];
        assert_eq!(class_of("abc::ab"), OclClass::Lost);
        assert_eq!(class_of("ab::A"), OclClass::NotApplicable);
        assert_eq!(class_of("ab::B"), OclClass::NotApplicable);
        assert_eq!(result.counts.total(), table.len());
    }

    #[test]
    fn test_origin_outside_subtree_is_not_applicable() {
        let (table, assignment) = five_species();
        let og = OrthogroupId::new("OG5");
        let result = analyze(&table, &og, &members(&assignment, &["A", "B"])).unwrap();
        assert_eq!(table.blocks[result.origin].id(), "abc::ab");
        let class_of = |id: &str| result.classes[table.find(id).unwrap().index];
        assert_eq!(class_of("ROOT::all"), OclClass::NotApplicable);
        assert_eq!(class_of("abc::C"), OclClass::NotApplicable);
        assert_eq!(class_of("all::de"), OclClass::NotApplicable);
        assert_eq!(result.counts.conserved, 2);
    }

    #[test]
    fn test_tie_prefers_deeper_block() {
        // u has a single child, so top::u and u::ab cover the same species
        let (table, assignment) = table(
            "(((A,B)ab)u,C)top;",
            &[("A", "X"), ("B", "X"), ("C", "Y")],
        );
        let og = OrthogroupId::new("OG7");
        let result = analyze(&table, &og, &members(&assignment, &["A", "B"])).unwrap();
        assert_eq!(table.blocks[result.origin].id(), "u::ab");
        let class_of = |id: &str| result.classes[table.find(id).unwrap().index];
        assert_eq!(class_of("top::u"), OclClass::NotApplicable);
        assert_eq!(class_of("ab::A"), OclClass::Conserved);
        assert_eq!(class_of("ab::B"), OclClass::Conserved);
    }

    #[test]
    fn test_empty_membership_is_rejected() {
        let (table, assignment) = five_species();
        let og = OrthogroupId::new("OG6");
        let err = analyze(&table, &og, &assignment.empty_set()).unwrap_err();
        assert_eq!(err, MembershipError::EmptySpeciesSet(og));
        assert_eq!(err.reason(), "empty_species_set");
    }
}
