//! Origin-Conservation-Loss analysis.
//!
//! - [`analyzer`]: classifies every block of one topology for one orthogroup
//! - [`aggregate`]: per-pair summaries and cross-topology orthogroup summaries
//! - [`block_stats`]: per-block class tallies across orthogroups
//!
//! ## Classes
//!
//! | Class | Meaning |
//! |-------|---------|
//! | `origin` | Smallest block holding every species of the orthogroup |
//! | `conserved` | Below the origin, some species below the block carry it |
//! | `lost` | Below the origin, first block on a path where none do |
//! | `not_applicable` | Outside the origin subtree, or below a loss |

pub mod aggregate;
pub mod analyzer;
pub mod block_stats;

pub use aggregate::{summarize_orthogroup, OrthogroupSummary, PairSummary};
pub use analyzer::{analyze, ClassCounts, MembershipError, OclResult};
pub use block_stats::BlockStatistics;
