use serde::{Deserialize, Serialize};

/// Identifier of a major clade (a topology leaf before grafting)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CladeId(pub String);

impl CladeId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CladeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an orthogroup from the membership table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrthogroupId(pub String);

impl OrthogroupId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrthogroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1-based index of a generated topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TopologyId(pub usize);

impl std::fmt::Display for TopologyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-block Origin-Conservation-Loss classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OclClass {
    /// The block where the orthogroup first appears (MRCA of its species)
    Origin,
    /// Below the origin, the lineage still carries the orthogroup
    Conserved,
    /// Below the origin, the first block on a path where the orthogroup is absent
    Lost,
    /// Outside the origin subtree, or below an earlier loss
    NotApplicable,
}

impl OclClass {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Origin => "origin",
            Self::Conserved => "conserved",
            Self::Lost => "lost",
            Self::NotApplicable => "not_applicable",
        }
    }
}

impl std::fmt::Display for OclClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the root of every generated topology is placed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RootingConvention {
    /// An implicit root anchor sits above all clades: every rooted arrangement
    /// is enumerated, (2N-3)!! topologies
    #[default]
    Anchor,
    /// The designated outgroup is sister to all other clades, (2N-5)!! topologies
    Outgroup,
}

/// Whether an orthogroup's origin falls on the same clades in every topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginStability {
    Stable,
    Unstable,
    /// No topology could be evaluated for the orthogroup
    Undetermined,
}

impl std::fmt::Display for OriginStability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stable => write!(f, "stable"),
            Self::Unstable => write!(f, "unstable"),
            Self::Undetermined => write!(f, "undetermined"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ocl_class_display() {
        assert_eq!(OclClass::Origin.to_string(), "origin");
        assert_eq!(OclClass::NotApplicable.to_string(), "not_applicable");
    }

    #[test]
    fn test_ocl_class_serde_matches_display() {
        for class in [
            OclClass::Origin,
            OclClass::Conserved,
            OclClass::Lost,
            OclClass::NotApplicable,
        ] {
            let json = serde_json::to_string(&class).unwrap();
            assert_eq!(json, format!("\"{class}\""));
        }
    }

    #[test]
    fn test_default_rooting_is_anchor() {
        assert_eq!(RootingConvention::default(), RootingConvention::Anchor);
    }
}
