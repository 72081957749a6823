//! Clade topology enumeration.
//!
//! [`TopologyGenerator`] produces every distinct rooted bifurcating
//! arrangement of a clade list, each in canonical form with a stable name and
//! MD5 signature.
//!
//! ## Example
//!
//! ```rust
//! use clade_ocl::core::types::{CladeId, RootingConvention};
//! use clade_ocl::topology::TopologyGenerator;
//!
//! let clades: Vec<CladeId> = ["Vertebrata", "Mollusca", "Outgroup"]
//!     .iter()
//!     .map(|c| CladeId::new(*c))
//!     .collect();
//! let generator = TopologyGenerator::new(&clades, RootingConvention::Anchor, None).unwrap();
//! assert_eq!(generator.generate().len(), 3);
//! ```

pub mod generator;

pub use generator::{ConfigurationError, GeneratedTopology, TopologyGenerator};
