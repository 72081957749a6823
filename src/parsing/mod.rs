//! Parsers for the three run inputs.
//!
//! This module provides parsers for:
//!
//! - **Newick trees**: The reference species tree ([`newick`])
//! - **Clade assignment tables**: `species<TAB>clade` rows ([`assignments`])
//! - **Orthogroup membership tables**: orthogroup id followed by member species
//!   or GIGANTIC sequence identifiers ([`orthogroups`])
//!
//! Every file parser accepts plain text or gzip/bgzip compressed input
//! (`.gz`, `.bgz`).
//!
//! ## Example
//!
//! ```rust,no_run
//! use clade_ocl::parsing::newick::{parse_newick, parse_newick_file};
//! use std::path::Path;
//!
//! // Parse from a file
//! let tree = parse_newick_file(Path::new("species_tree.newick")).unwrap();
//!
//! // Or parse from raw text
//! let tree = parse_newick("((Homo_sapiens,Octopus_bimaculoides),Crassostrea_gigas);").unwrap();
//! assert_eq!(tree.leaf_labels().len(), 3);
//! ```

use std::io::Read;
use std::path::Path;

use flate2::read::MultiGzDecoder;
use thiserror::Error;

pub mod assignments;
pub mod newick;
pub mod orthogroups;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Too many records: {0} exceeds maximum allowed")]
    TooManyRecords(usize),
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Read a whole text file, transparently decompressing gzip/bgzip input
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened, decompressed or is
/// not valid UTF-8.
pub fn read_text(path: &Path) -> Result<String, ParseError> {
    if is_gzipped(path) {
        let file = std::fs::File::open(path)?;
        let mut decoder = MultiGzDecoder::new(file);
        let mut content = String::new();
        decoder.read_to_string(&mut content)?;
        Ok(content)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Split a table line on tabs, falling back to commas when no tab is present
pub(crate) fn split_fields(line: &str) -> Vec<&str> {
    if line.contains('\t') {
        line.split('\t').map(str::trim).collect()
    } else {
        line.split(',').map(str::trim).collect()
    }
}
