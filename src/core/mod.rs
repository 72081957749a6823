//! Core data types for clade topologies and species trees.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`CladeAssignment`]: The master species list and its partition into clades
//! - [`SpeciesSet`]: Bitset over master species indices
//! - [`SpeciesTree`]: Arena-backed rooted tree with labelled nodes
//! - [`Topology`]: Nested-bipartition arrangement of clades
//! - [`CladeId`], [`OrthogroupId`], [`TopologyId`]: Identifier types
//! - [`OclClass`], [`OriginStability`], [`RootingConvention`]: Classification types
//!
//! ## Node Labels
//!
//! Full species trees are labelled so that every block can be named by its
//! parent and child labels:
//!
//! | Node | Label |
//! |------|-------|
//! | Species leaf | species id, e.g. `Homo_sapiens` |
//! | Clade subtree root | clade id, e.g. `Mollusca` |
//! | Other clade-internal node | `<clade>_<k>` in preorder, e.g. `Mollusca_1` |
//! | Node above grafting points | clade ids joined by `+`, e.g. `Mollusca+Vertebrata` |
//!
//! [`CladeAssignment`]: clade::CladeAssignment
//! [`SpeciesSet`]: species_set::SpeciesSet
//! [`SpeciesTree`]: tree::SpeciesTree
//! [`Topology`]: topology::Topology
//! [`CladeId`]: types::CladeId
//! [`OrthogroupId`]: types::OrthogroupId
//! [`TopologyId`]: types::TopologyId
//! [`OclClass`]: types::OclClass
//! [`OriginStability`]: types::OriginStability
//! [`RootingConvention`]: types::RootingConvention

pub mod clade;
pub mod species_set;
pub mod topology;
pub mod tree;
pub mod types;
