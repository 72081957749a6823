//! Phylogenetic blocks: the parent-to-child edges of a full species tree.
//!
//! A block is identified by `parent::child` labels and carries the set of
//! species below it. Blocks are the unit every OCL classification is made on.

pub mod extractor;

pub use extractor::{extract_blocks, BlockTable, PhylogeneticBlock};
