//! Exhaustive enumeration of rooted bifurcating clade topologies.
//!
//! Topologies are built by sequential addition: starting from the two-clade
//! tree, each further clade is inserted at every insertion point of every
//! topology built so far. Every result is canonicalized and deduplicated by
//! its canonical Newick text.

use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::core::topology::Topology;
use crate::core::types::{CladeId, RootingConvention, TopologyId};
use crate::utils::validation::{
    compute_signature, is_valid_identifier, odd_double_factorial, MAX_CLADES,
};

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("At least 2 clades are required, got {0}")]
    TooFewClades(usize),

    #[error("Too many clades: {count} exceeds maximum of {max}")]
    TooManyClades { count: usize, max: usize },

    #[error("Duplicate clade id: '{0}'")]
    DuplicateClade(CladeId),

    #[error("Invalid clade id: '{0}'")]
    InvalidCladeId(String),

    #[error("Rooting convention 'outgroup' requires an outgroup clade")]
    MissingOutgroup,

    #[error("Outgroup '{0}' is not one of the clades")]
    UnknownOutgroup(CladeId),

    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

/// A canonical topology with its stable identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTopology {
    pub id: TopologyId,
    /// Deterministic file-safe name, e.g. `topology_001`
    pub name: String,
    pub topology: Topology,
    /// Canonical clade-level Newick text
    pub newick: String,
    /// MD5 of `newick`
    pub signature: String,
}

/// Enumerates every rooted topology over a fixed clade list
#[derive(Debug, Clone)]
pub struct TopologyGenerator {
    /// Clades in rank order (outgroup first when designated)
    clades: Vec<CladeId>,
    rooting: RootingConvention,
    outgroup: Option<CladeId>,
    rank: HashMap<CladeId, usize>,
}

impl TopologyGenerator {
    /// Validate the clade list and rooting configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` for fewer than 2 or more than
    /// `MAX_CLADES` clades, duplicate or invalid ids, or an outgroup that is
    /// missing (under the outgroup convention) or not among the clades.
    pub fn new(
        clades: &[CladeId],
        rooting: RootingConvention,
        outgroup: Option<CladeId>,
    ) -> Result<Self, ConfigurationError> {
        if clades.len() < 2 {
            return Err(ConfigurationError::TooFewClades(clades.len()));
        }
        if clades.len() > MAX_CLADES {
            return Err(ConfigurationError::TooManyClades {
                count: clades.len(),
                max: MAX_CLADES,
            });
        }

        let mut seen = HashSet::new();
        for clade in clades {
            if !is_valid_identifier(clade.as_str()) || clade.as_str().contains('+') {
                return Err(ConfigurationError::InvalidCladeId(clade.0.clone()));
            }
            if !seen.insert(clade) {
                return Err(ConfigurationError::DuplicateClade(clade.clone()));
            }
        }

        if let Some(out) = &outgroup {
            if !seen.contains(out) {
                return Err(ConfigurationError::UnknownOutgroup(out.clone()));
            }
        } else if rooting == RootingConvention::Outgroup {
            return Err(ConfigurationError::MissingOutgroup);
        }

        let ordered: Vec<CladeId> = outgroup
            .iter()
            .cloned()
            .chain(clades.iter().filter(|c| Some(*c) != outgroup.as_ref()).cloned())
            .collect();
        let rank = ordered
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        Ok(Self {
            clades: ordered,
            rooting,
            outgroup,
            rank,
        })
    }

    /// Clades in canonical rank order
    #[must_use]
    pub fn clades(&self) -> &[CladeId] {
        &self.clades
    }

    /// Canonical rank of each clade
    #[must_use]
    pub fn rank(&self) -> &HashMap<CladeId, usize> {
        &self.rank
    }

    #[must_use]
    pub fn rooting(&self) -> RootingConvention {
        self.rooting
    }

    /// Number of topologies `generate` yields: (2N-3)!! under the anchor
    /// convention, (2N-5)!! with a fixed outgroup.
    #[must_use]
    pub fn expected_topology_count(&self) -> u64 {
        let n = self.clades.len() as u64;
        match self.rooting {
            RootingConvention::Anchor => odd_double_factorial(2 * n - 3),
            RootingConvention::Outgroup => odd_double_factorial((2 * n).saturating_sub(5)),
        }
    }

    /// Every distinct canonical topology, in deterministic order
    #[must_use]
    pub fn generate(&self) -> Vec<GeneratedTopology> {
        let topologies = match (&self.rooting, &self.outgroup) {
            (RootingConvention::Outgroup, Some(outgroup)) => {
                let ingroup: Vec<&CladeId> =
                    self.clades.iter().filter(|c| *c != outgroup).collect();
                self.enumerate(&ingroup)
                    .into_iter()
                    .map(|t| {
                        Topology::join(Topology::Leaf(outgroup.clone()), t).canonical(&self.rank)
                    })
                    .collect()
            }
            _ => {
                let all: Vec<&CladeId> = self.clades.iter().collect();
                self.enumerate(&all)
            }
        };

        let width = topologies.len().to_string().len().max(3);
        let generated: Vec<GeneratedTopology> = topologies
            .into_iter()
            .enumerate()
            .map(|(i, topology)| {
                let newick = topology.to_newick();
                GeneratedTopology {
                    id: TopologyId(i + 1),
                    name: format!("topology_{:0width$}", i + 1),
                    signature: compute_signature(&newick),
                    newick,
                    topology,
                }
            })
            .collect();

        tracing::info!(
            clades = self.clades.len(),
            topologies = generated.len(),
            rooting = ?self.rooting,
            "Generated clade topologies"
        );
        generated
    }

    /// Sequential addition over `clades`, deduplicated by canonical Newick
    fn enumerate(&self, clades: &[&CladeId]) -> Vec<Topology> {
        let mut current = match clades {
            [] => return Vec::new(),
            [only] => return vec![Topology::Leaf((*only).clone())],
            [first, second, ..] => vec![Topology::join(
                Topology::Leaf((*first).clone()),
                Topology::Leaf((*second).clone()),
            )
            .canonical(&self.rank)],
        };

        for (step, clade) in clades[2..].iter().enumerate() {
            // Each (step + 2)-clade topology has 2k-1 insertion points
            let points = 2 * (step + 2) - 1;
            let mut seen: HashSet<String> = HashSet::new();
            let mut next = Vec::with_capacity(current.len() * points);
            for topology in &current {
                for point in topology.insertion_points() {
                    let Some(inserted) = topology.insert_at(&point, clade) else {
                        continue;
                    };
                    let canonical = inserted.canonical(&self.rank);
                    if seen.insert(canonical.to_newick()) {
                        next.push(canonical);
                    } else {
                        tracing::debug!(clade = %clade, "Duplicate topology discarded");
                    }
                }
            }
            current = next;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clades(names: &[&str]) -> Vec<CladeId> {
        names.iter().map(|n| CladeId::new(*n)).collect()
    }

    #[test]
    fn test_topology_counts_follow_double_factorial() {
        let names = ["A", "B", "C", "D", "E", "F"];
        for (n, expected) in [(2, 1), (3, 3), (4, 15), (5, 105), (6, 945)] {
            let generator =
                TopologyGenerator::new(&clades(&names[..n]), RootingConvention::Anchor, None)
                    .unwrap();
            let topologies = generator.generate();
            assert_eq!(topologies.len(), expected, "N = {n}");
            assert_eq!(generator.expected_topology_count(), expected as u64);

            let unique: HashSet<&str> = topologies.iter().map(|t| t.newick.as_str()).collect();
            assert_eq!(unique.len(), expected);
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let input = clades(&["Vertebrata", "Mollusca", "Cnidaria", "Outgroup"]);
        let a = TopologyGenerator::new(&input, RootingConvention::Anchor, None)
            .unwrap()
            .generate();
        let b = TopologyGenerator::new(&input, RootingConvention::Anchor, None)
            .unwrap()
            .generate();
        assert_eq!(a, b);
        assert_eq!(a[0].name, "topology_001");
        assert_eq!(a[14].name, "topology_015");
        assert_eq!(a[0].signature.len(), 32);
    }

    #[test]
    fn test_three_clades_have_distinct_sister_pairs() {
        let input = clades(&["Vertebrata", "Mollusca", "Outgroup"]);
        let generator = TopologyGenerator::new(
            &input,
            RootingConvention::Anchor,
            Some(CladeId::new("Outgroup")),
        )
        .unwrap();
        let topologies = generator.generate();
        assert_eq!(topologies.len(), 3);

        let mut pairs: Vec<(String, String)> = topologies
            .iter()
            .map(|g| {
                let pairs = g.topology.sister_pairs();
                assert_eq!(pairs.len(), 1);
                let mut pair = [pairs[0].0.to_string(), pairs[0].1.to_string()];
                pair.sort();
                (pair[0].clone(), pair[1].clone())
            })
            .collect();
        pairs.sort();
        pairs.dedup();
        assert_eq!(pairs.len(), 3);

        assert!(topologies
            .iter()
            .any(|g| g.newick == "(Outgroup,(Vertebrata,Mollusca));"));
    }

    #[test]
    fn test_outgroup_convention() {
        let input = clades(&["Vertebrata", "Mollusca", "Cnidaria", "Outgroup"]);
        let generator = TopologyGenerator::new(
            &input,
            RootingConvention::Outgroup,
            Some(CladeId::new("Outgroup")),
        )
        .unwrap();
        let topologies = generator.generate();
        assert_eq!(topologies.len(), 3);
        assert_eq!(generator.expected_topology_count(), 3);
        assert!(topologies
            .iter()
            .all(|g| g.newick.starts_with("(Outgroup,(")));
    }

    #[test]
    fn test_outgroup_convention_with_two_clades() {
        let input = clades(&["Vertebrata", "Outgroup"]);
        let generator = TopologyGenerator::new(
            &input,
            RootingConvention::Outgroup,
            Some(CladeId::new("Outgroup")),
        )
        .unwrap();
        let topologies = generator.generate();
        assert_eq!(topologies.len(), 1);
        assert_eq!(topologies[0].newick, "(Outgroup,Vertebrata);");
    }

    #[test]
    fn test_configuration_errors() {
        assert!(matches!(
            TopologyGenerator::new(&clades(&["A"]), RootingConvention::Anchor, None),
            Err(ConfigurationError::TooFewClades(1))
        ));
        assert!(matches!(
            TopologyGenerator::new(&clades(&["A", "B", "A"]), RootingConvention::Anchor, None),
            Err(ConfigurationError::DuplicateClade(_))
        ));
        assert!(matches!(
            TopologyGenerator::new(&clades(&["A", "B+C"]), RootingConvention::Anchor, None),
            Err(ConfigurationError::InvalidCladeId(_))
        ));
        let many: Vec<CladeId> = (0..=MAX_CLADES).map(|i| CladeId::new(format!("C{i}"))).collect();
        assert!(matches!(
            TopologyGenerator::new(&many, RootingConvention::Anchor, None),
            Err(ConfigurationError::TooManyClades { .. })
        ));
        assert!(matches!(
            TopologyGenerator::new(&clades(&["A", "B"]), RootingConvention::Outgroup, None),
            Err(ConfigurationError::MissingOutgroup)
        ));
        assert!(matches!(
            TopologyGenerator::new(
                &clades(&["A", "B"]),
                RootingConvention::Anchor,
                Some(CladeId::new("Z"))
            ),
            Err(ConfigurationError::UnknownOutgroup(_))
        ));
    }
}
