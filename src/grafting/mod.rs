//! Grafting of species-level clade subtrees onto clade topologies.
//!
//! [`CladeSubtrees::derive`] cuts one subtree per clade out of the reference
//! species tree; [`Grafter::graft`] attaches those subtrees at the leaves of a
//! generated topology to build a full species tree.

use thiserror::Error;

use crate::core::clade::AssignmentError;
use crate::core::types::CladeId;

pub mod grafter;
pub mod subtree;

pub use grafter::Grafter;
pub use subtree::CladeSubtrees;

#[derive(Error, Debug)]
pub enum StructuralError {
    #[error("No subtree available for clade '{0}'")]
    MissingAttachment(CladeId),

    #[error("Clade '{0}' is attached more than once")]
    DuplicateAttachment(CladeId),

    #[error("Subtree for clade '{0}' has no species")]
    EmptySubtree(CladeId),

    #[error("Grafted tree has {found} leaves but the master species list has {expected}")]
    LeafSetMismatch { expected: usize, found: usize },

    #[error("Node label '{0}' occurs more than once")]
    DuplicateLabel(String),

    #[error("Leaf label '{0}' occurs more than once in the reference tree")]
    DuplicateLeaf(String),

    #[error("Tree contains an unlabelled {0} node")]
    UnlabeledNode(&'static str),

    #[error("Leaf '{0}' is not in the master species list")]
    UnknownLeaf(String),
}

#[derive(Error, Debug)]
pub enum GraftError {
    #[error("Assignment error: {0}")]
    Assignment(#[from] AssignmentError),

    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),
}
