use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::types::{CladeId, RootingConvention};
use crate::pipeline::PipelineError;
use crate::topology::ConfigurationError;

/// Default number of orthogroups evaluated per parallel chunk
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Settings for one pipeline run.
///
/// Every field has a default so a JSON config file only needs the keys it
/// changes; command-line flags override file values.
///
/// # Example
///
/// ```
/// use clade_ocl::pipeline::PipelineConfig;
///
/// let config = PipelineConfig::from_json(r#"{
///     "assignments": "clades.tsv",
///     "reference_tree": "species_tree.newick",
///     "orthogroups": "orthogroups.tsv",
///     "clade_order": ["Vertebrata", "Mollusca", "Outgroup"],
///     "num_threads": 4
/// }"#).unwrap();
/// assert_eq!(config.clade_order.len(), 3);
/// assert!(config.write_ocl_table);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Species-to-clade assignment table
    pub assignments: Option<PathBuf>,
    /// Reference species tree in Newick format
    pub reference_tree: Option<PathBuf>,
    /// Orthogroup membership table
    pub orthogroups: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Explicit clade order; empty keeps the assignment table's order
    pub clade_order: Vec<CladeId>,
    pub outgroup: Option<CladeId>,
    pub rooting: RootingConvention,
    /// Worker threads for pair evaluation; `None` uses all cores
    pub num_threads: Option<usize>,
    pub chunk_size: usize,
    /// Write the per-block `ocl.tsv` table (the largest output)
    pub write_ocl_table: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            assignments: None,
            reference_tree: None,
            orthogroups: None,
            output_dir: PathBuf::from("clade_ocl_output"),
            clade_order: Vec::new(),
            outgroup: None,
            rooting: RootingConvention::default(),
            num_threads: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            write_ocl_table: true,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file.
    ///
    /// Relative input paths are resolved against the directory holding the
    /// file. `output_dir` stays relative to the working directory.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Io` if the file cannot be read or
    /// `PipelineError::Json` if it is not a valid config.
    pub fn load_from_file(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_json(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_inputs(base);
        }
        Ok(config)
    }

    fn resolve_inputs(&mut self, base: &Path) {
        for input in [
            &mut self.assignments,
            &mut self.reference_tree,
            &mut self.orthogroups,
        ] {
            if let Some(p) = input.as_mut().filter(|p| p.is_relative()) {
                *p = base.join(&*p);
            }
        }
    }

    /// Parse a config from JSON text
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Json` for malformed JSON or unknown keys.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Check that every input is present and settings are usable
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingInput` for an absent input path,
    /// or `ConfigurationError::InvalidSetting` for a zero thread count or
    /// chunk size.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.assignments_path()?;
        self.reference_tree_path()?;
        self.orthogroups_path()?;
        if self.num_threads == Some(0) {
            return Err(ConfigurationError::InvalidSetting(
                "num_threads must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(ConfigurationError::InvalidSetting(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingInput` when unset.
    pub fn assignments_path(&self) -> Result<&Path, ConfigurationError> {
        self.assignments
            .as_deref()
            .ok_or_else(|| ConfigurationError::MissingInput("assignments".to_string()))
    }

    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingInput` when unset.
    pub fn reference_tree_path(&self) -> Result<&Path, ConfigurationError> {
        self.reference_tree
            .as_deref()
            .ok_or_else(|| ConfigurationError::MissingInput("reference_tree".to_string()))
    }

    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingInput` when unset.
    pub fn orthogroups_path(&self) -> Result<&Path, ConfigurationError> {
        self.orthogroups
            .as_deref()
            .ok_or_else(|| ConfigurationError::MissingInput("orthogroups".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.rooting, RootingConvention::Anchor);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_parse_and_roundtrip() {
        let config = PipelineConfig::from_json(
            r#"{"assignments": "a.tsv", "rooting": "outgroup", "outgroup": "Outgroup", "write_ocl_table": false}"#,
        )
        .unwrap();
        assert_eq!(config.rooting, RootingConvention::Outgroup);
        assert_eq!(config.outgroup, Some(CladeId::new("Outgroup")));
        assert!(!config.write_ocl_table);

        let again = PipelineConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(
            PipelineConfig::from_json(r#"{"threads": 4}"#),
            Err(PipelineError::Json(_))
        ));
    }

    #[test]
    fn test_validate() {
        let mut config = PipelineConfig {
            assignments: Some(PathBuf::from("a.tsv")),
            reference_tree: Some(PathBuf::from("t.nwk")),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::MissingInput(ref s)) if s == "orthogroups"
        ));

        config.orthogroups = Some(PathBuf::from("og.tsv"));
        assert!(config.validate().is_ok());

        config.num_threads = Some(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidSetting(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"chunk_size": 8, "clade_order": ["A", "B"]}"#).unwrap();
        let config = PipelineConfig::load_from_file(&path).unwrap();
        assert_eq!(config.chunk_size, 8);
        assert_eq!(config.clade_order, vec![CladeId::new("A"), CladeId::new("B")]);
    }

    #[test]
    fn test_file_inputs_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("run");
        std::fs::create_dir(&nested).unwrap();
        let absolute = dir.path().join("shared").join("orthogroups.tsv");
        let path = nested.join("config.json");
        let json = serde_json::json!({
            "assignments": "clades.tsv",
            "reference_tree": "trees/species.newick",
            "orthogroups": absolute,
            "output_dir": "out",
        });
        std::fs::write(&path, json.to_string()).unwrap();

        let config = PipelineConfig::load_from_file(&path).unwrap();
        assert_eq!(config.assignments, Some(nested.join("clades.tsv")));
        assert_eq!(config.reference_tree, Some(nested.join("trees/species.newick")));
        assert_eq!(config.orthogroups, Some(absolute));
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }
}
