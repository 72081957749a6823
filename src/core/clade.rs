use std::collections::HashMap;
use thiserror::Error;

use crate::core::species_set::SpeciesSet;
use crate::core::types::CladeId;
use crate::utils::validation::is_valid_identifier;

#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error("Species '{species}' is assigned to multiple clades ('{first}' and '{second}')")]
    MultiplyAssigned {
        species: String,
        first: CladeId,
        second: CladeId,
    },

    #[error("Species '{0}' in the reference tree is not assigned to any clade")]
    Unassigned(String),

    #[error("Species '{0}' is assigned to a clade but missing from the reference tree")]
    MissingFromReference(String),

    #[error("Clade '{0}' has assigned species but is not listed in the clade order")]
    UnlistedClade(CladeId),

    #[error("Clade '{0}' is listed in the clade order but has no assigned species")]
    EmptyClade(CladeId),

    #[error("Invalid identifier in assignment table: '{0}'")]
    InvalidIdentifier(String),

    #[error("Assignment table contains no species")]
    Empty,
}

/// One row of the species-to-clade assignment table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRow {
    pub species: String,
    pub clade: CladeId,
    /// 1-based source line, for diagnostics
    pub line: usize,
}

impl AssignmentRow {
    pub fn new(species: impl Into<String>, clade: impl Into<String>) -> Self {
        Self {
            species: species.into(),
            clade: CladeId::new(clade),
            line: 0,
        }
    }
}

/// The master species list and its partition into clades.
///
/// Species are stored sorted by name; a species' position in that list is its
/// index in every [`SpeciesSet`]. Clades keep the order in which they were
/// first seen, or an explicit order set with [`CladeAssignment::with_clade_order`].
#[derive(Debug, Clone)]
pub struct CladeAssignment {
    clades: Vec<CladeId>,
    species: Vec<String>,
    /// Index into `clades` for each species
    species_clade: Vec<usize>,
    lookup: HashMap<String, usize>,
}

impl CladeAssignment {
    /// Build the assignment from table rows.
    ///
    /// # Errors
    ///
    /// Returns `AssignmentError::MultiplyAssigned` when a species appears under
    /// two different clades, `AssignmentError::InvalidIdentifier` for unusable
    /// ids, or `AssignmentError::Empty` when there are no rows.
    pub fn from_rows(rows: &[AssignmentRow]) -> Result<Self, AssignmentError> {
        let mut clades: Vec<CladeId> = Vec::new();
        let mut clade_of: HashMap<&str, &CladeId> = HashMap::new();

        for row in rows {
            if !is_valid_identifier(&row.species) {
                return Err(AssignmentError::InvalidIdentifier(row.species.clone()));
            }
            if !is_valid_identifier(row.clade.as_str()) {
                return Err(AssignmentError::InvalidIdentifier(row.clade.0.clone()));
            }

            match clade_of.get(row.species.as_str()) {
                Some(existing) if **existing != row.clade => {
                    return Err(AssignmentError::MultiplyAssigned {
                        species: row.species.clone(),
                        first: (*existing).clone(),
                        second: row.clade.clone(),
                    });
                }
                Some(_) => {
                    tracing::debug!(species = %row.species, line = row.line, "Duplicate assignment row ignored");
                }
                None => {
                    clade_of.insert(&row.species, &row.clade);
                }
            }

            if !clades.contains(&row.clade) {
                clades.push(row.clade.clone());
            }
        }

        if clade_of.is_empty() {
            return Err(AssignmentError::Empty);
        }

        let mut species: Vec<String> = clade_of.keys().map(|s| (*s).to_string()).collect();
        species.sort();

        let species_clade = species
            .iter()
            .map(|s| {
                let clade = clade_of[s.as_str()];
                clades.iter().position(|c| c == clade).unwrap_or_default()
            })
            .collect();

        let lookup = species
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();

        Ok(Self {
            clades,
            species,
            species_clade,
            lookup,
        })
    }

    /// Reorder clades to match an explicit clade list.
    ///
    /// # Errors
    ///
    /// Returns `AssignmentError::UnlistedClade` if a clade with species is
    /// absent from `order`, or `AssignmentError::EmptyClade` if `order` names a
    /// clade without species.
    pub fn with_clade_order(mut self, order: &[CladeId]) -> Result<Self, AssignmentError> {
        for clade in order {
            if !self.clades.contains(clade) {
                return Err(AssignmentError::EmptyClade(clade.clone()));
            }
        }
        for clade in &self.clades {
            if !order.contains(clade) {
                return Err(AssignmentError::UnlistedClade(clade.clone()));
            }
        }

        let remap: Vec<usize> = self
            .clades
            .iter()
            .map(|c| order.iter().position(|o| o == c).unwrap_or_default())
            .collect();
        for clade_index in &mut self.species_clade {
            *clade_index = remap[*clade_index];
        }
        self.clades = order.to_vec();
        Ok(self)
    }

    /// Clades in their configured order
    #[must_use]
    pub fn clades(&self) -> &[CladeId] {
        &self.clades
    }

    /// Position of a clade in the configured order
    #[must_use]
    pub fn clade_rank(&self, clade: &CladeId) -> Option<usize> {
        self.clades.iter().position(|c| c == clade)
    }

    /// Master species list, sorted
    #[must_use]
    pub fn species(&self) -> &[String] {
        &self.species
    }

    #[must_use]
    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    #[must_use]
    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    #[must_use]
    pub fn species_name(&self, index: usize) -> Option<&str> {
        self.species.get(index).map(String::as_str)
    }

    /// Clade of the species at `index`
    #[must_use]
    pub fn clade_of(&self, index: usize) -> Option<&CladeId> {
        self.species_clade.get(index).map(|&c| &self.clades[c])
    }

    /// Member species of a clade, sorted by name
    #[must_use]
    pub fn members(&self, clade: &CladeId) -> Vec<&str> {
        let Some(rank) = self.clade_rank(clade) else {
            return Vec::new();
        };
        self.species
            .iter()
            .zip(&self.species_clade)
            .filter(|&(_, &c)| c == rank)
            .map(|(s, _)| s.as_str())
            .collect()
    }

    /// An empty set sized for the master list
    #[must_use]
    pub fn empty_set(&self) -> SpeciesSet {
        SpeciesSet::with_capacity(self.species.len())
    }

    /// Clades with at least one species in `set`, in configured order
    #[must_use]
    pub fn clade_span(&self, set: &SpeciesSet) -> Vec<&CladeId> {
        let mut present = vec![false; self.clades.len()];
        for index in set.iter() {
            present[self.species_clade[index]] = true;
        }
        self.clades
            .iter()
            .zip(present)
            .filter_map(|(c, p)| p.then_some(c))
            .collect()
    }

    /// Clade span joined with `+`, e.g. `Mollusca+Vertebrata`
    #[must_use]
    pub fn clade_span_label(&self, set: &SpeciesSet) -> String {
        self.clade_span(set)
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join("+")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_rows() -> Vec<AssignmentRow> {
        vec![
            AssignmentRow::new("Homo_sapiens", "Vertebrata"),
            AssignmentRow::new("Octopus_bimaculoides", "Mollusca"),
            AssignmentRow::new("Crassostrea_gigas", "Outgroup"),
        ]
    }

    #[test]
    fn test_from_rows_orders_species_and_clades() {
        let assignment = CladeAssignment::from_rows(&demo_rows()).unwrap();
        assert_eq!(
            assignment.species(),
            &["Crassostrea_gigas", "Homo_sapiens", "Octopus_bimaculoides"]
        );
        assert_eq!(
            assignment.clades(),
            &[
                CladeId::new("Vertebrata"),
                CladeId::new("Mollusca"),
                CladeId::new("Outgroup")
            ]
        );
        let human = assignment.species_index("Homo_sapiens").unwrap();
        assert_eq!(assignment.clade_of(human), Some(&CladeId::new("Vertebrata")));
    }

    #[test]
    fn test_multiply_assigned_species_is_rejected() {
        let mut rows = demo_rows();
        rows.push(AssignmentRow::new("Homo_sapiens", "Mollusca"));
        let err = CladeAssignment::from_rows(&rows).unwrap_err();
        assert!(matches!(
            err,
            AssignmentError::MultiplyAssigned { ref species, .. } if species == "Homo_sapiens"
        ));
    }

    #[test]
    fn test_repeated_identical_row_is_tolerated() {
        let mut rows = demo_rows();
        rows.push(AssignmentRow::new("Homo_sapiens", "Vertebrata"));
        let assignment = CladeAssignment::from_rows(&rows).unwrap();
        assert_eq!(assignment.species_count(), 3);
    }

    #[test]
    fn test_empty_and_invalid_rows() {
        assert!(matches!(
            CladeAssignment::from_rows(&[]),
            Err(AssignmentError::Empty)
        ));
        let rows = vec![AssignmentRow::new("ROOT", "Vertebrata")];
        assert!(matches!(
            CladeAssignment::from_rows(&rows),
            Err(AssignmentError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_with_clade_order() {
        let assignment = CladeAssignment::from_rows(&demo_rows()).unwrap();
        let order = vec![
            CladeId::new("Outgroup"),
            CladeId::new("Mollusca"),
            CladeId::new("Vertebrata"),
        ];
        let reordered = assignment.clone().with_clade_order(&order).unwrap();
        assert_eq!(reordered.clades(), order.as_slice());
        let human = reordered.species_index("Homo_sapiens").unwrap();
        assert_eq!(reordered.clade_of(human), Some(&CladeId::new("Vertebrata")));

        let missing = vec![CladeId::new("Outgroup"), CladeId::new("Mollusca")];
        assert!(matches!(
            assignment.clone().with_clade_order(&missing),
            Err(AssignmentError::UnlistedClade(_))
        ));

        let mut extra = order.clone();
        extra.push(CladeId::new("Cnidaria"));
        assert!(matches!(
            assignment.with_clade_order(&extra),
            Err(AssignmentError::EmptyClade(_))
        ));
    }

    #[test]
    fn test_clade_span_label() {
        let assignment = CladeAssignment::from_rows(&demo_rows()).unwrap();
        let mut set = assignment.empty_set();
        set.insert(assignment.species_index("Octopus_bimaculoides").unwrap());
        set.insert(assignment.species_index("Homo_sapiens").unwrap());
        assert_eq!(assignment.clade_span_label(&set), "Vertebrata+Mollusca");
        assert_eq!(
            assignment.members(&CladeId::new("Mollusca")),
            vec!["Octopus_bimaculoides"]
        );
    }
}
