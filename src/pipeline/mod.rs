//! End-to-end pipeline: inputs in, OCL tables out.
//!
//! - [`config`]: run settings, loadable from JSON
//! - [`context`]: the shared read-only analysis context (assignment,
//!   topologies, grafted trees and block tables)
//! - [`runner`]: parallel pair evaluation and aggregation
//! - [`output`]: atomic TSV and text writers
//!
//! All fatal validation happens while the context is built, before the output
//! directory is created.

use thiserror::Error;

use crate::core::clade::AssignmentError;
use crate::grafting::{GraftError, StructuralError};
use crate::parsing::ParseError;
use crate::topology::ConfigurationError;

pub mod config;
pub mod context;
pub mod output;
pub mod runner;

pub use config::PipelineConfig;
pub use context::{AnalysisContext, TopologyModel};
pub use runner::{run, RunReport};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Assignment error: {0}")]
    Assignment(#[from] AssignmentError),

    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to configure thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<GraftError> for PipelineError {
    fn from(err: GraftError) -> Self {
        match err {
            GraftError::Assignment(e) => Self::Assignment(e),
            GraftError::Structural(e) => Self::Structural(e),
        }
    }
}

impl PipelineError {
    pub(crate) fn parse(path: &std::path::Path, source: ParseError) -> Self {
        Self::Parse {
            path: path.display().to_string(),
            source,
        }
    }
}
