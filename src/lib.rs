//! # clade-ocl
//!
//! A library for tracing the origin, conservation and loss (OCL) of
//! orthogroups across every alternative arrangement of a set of clades.
//!
//! When the branching order between major clades is unresolved, an
//! orthogroup's inferred origin and its pattern of losses depend on which
//! arrangement is assumed. `clade-ocl` evaluates all of them:
//!
//! ## Features
//!
//! - **Topology enumeration**: Every rooted binary topology over the clades,
//!   canonicalized and deduplicated
//! - **Subtree grafting**: Species-level subtrees of each clade attached to
//!   each topology
//! - **Block decomposition**: Every parent-child edge of a grafted tree as a
//!   phylogenetic block with its descendant species
//! - **OCL classification**: Origin, conserved, lost and not-applicable blocks
//!   per orthogroup and topology
//! - **Aggregation**: Origin stability and rate summaries across topologies
//!
//! ## Example
//!
//! ```rust
//! use clade_ocl::core::clade::{AssignmentRow, CladeAssignment};
//! use clade_ocl::core::types::RootingConvention;
//! use clade_ocl::parsing::newick::parse_newick;
//! use clade_ocl::parsing::orthogroups::OrthogroupMembership;
//! use clade_ocl::pipeline::AnalysisContext;
//! use clade_ocl::ocl::analyze;
//!
//! let assignment = CladeAssignment::from_rows(&[
//!     AssignmentRow::new("Homo_sapiens", "Vertebrata"),
//!     AssignmentRow::new("Octopus_bimaculoides", "Mollusca"),
//!     AssignmentRow::new("Crassostrea_gigas", "Outgroup"),
//! ])
//! .unwrap();
//! let reference =
//!     parse_newick("((Homo_sapiens,Octopus_bimaculoides),Crassostrea_gigas);").unwrap();
//! let context =
//!     AnalysisContext::from_parts(assignment, &reference, RootingConvention::Anchor, None)
//!         .unwrap();
//! assert_eq!(context.topologies.len(), 3);
//!
//! let og = OrthogroupMembership::new("OG1", ["Homo_sapiens", "Octopus_bimaculoides"]);
//! let species = og.resolve(&context.assignment).unwrap();
//! for model in &context.topologies {
//!     let result = analyze(&model.blocks, &og.id, &species).unwrap();
//!     println!("{}: origin block {}", model.generated.name, result.origin);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Identifiers, species sets, clade assignments and trees
//! - [`parsing`]: Parsers for assignment tables, Newick trees and orthogroups
//! - [`topology`]: Clade topology enumeration
//! - [`grafting`]: Per-clade subtrees and grafting onto topologies
//! - [`blocks`]: Phylogenetic block extraction
//! - [`ocl`]: OCL classification and aggregation
//! - [`pipeline`]: Configuration, parallel evaluation and output tables
//! - [`cli`]: Command-line interface implementation

pub mod blocks;
pub mod cli;
pub mod core;
pub mod grafting;
pub mod ocl;
pub mod parsing;
pub mod pipeline;
pub mod topology;
pub mod utils;

// Re-export commonly used types for convenience
pub use blocks::{extract_blocks, BlockTable, PhylogeneticBlock};
pub use core::clade::CladeAssignment;
pub use core::tree::SpeciesTree;
pub use core::types::*;
pub use grafting::{CladeSubtrees, Grafter};
pub use ocl::{analyze, OclResult};
pub use pipeline::{PipelineConfig, PipelineError, RunReport};
pub use topology::{GeneratedTopology, TopologyGenerator};
