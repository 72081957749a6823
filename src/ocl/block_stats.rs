use crate::core::types::TopologyId;
use crate::ocl::analyzer::{ClassCounts, OclResult};

/// Per-block class tallies across orthogroups, one row per block of every
/// topology
#[derive(Debug, Clone, Default)]
pub struct BlockStatistics {
    /// Indexed by topology position, then block index
    counts: Vec<Vec<ClassCounts>>,
}

impl BlockStatistics {
    /// Empty tallies for topologies with the given block counts
    #[must_use]
    pub fn new(block_counts: &[usize]) -> Self {
        Self {
            counts: block_counts
                .iter()
                .map(|&n| vec![ClassCounts::default(); n])
                .collect(),
        }
    }

    /// Add one evaluated pair. Results for unknown topologies are ignored.
    pub fn record(&mut self, result: &OclResult) {
        let Some(blocks) = result
            .topology
            .0
            .checked_sub(1)
            .and_then(|i| self.counts.get_mut(i))
        else {
            return;
        };
        for (tally, &class) in blocks.iter_mut().zip(&result.classes) {
            tally.add(class);
        }
    }

    pub fn merge(&mut self, other: &Self) {
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            for (a, b) in mine.iter_mut().zip(theirs) {
                a.merge(b);
            }
        }
    }

    #[must_use]
    pub fn get(&self, topology: TopologyId, block: usize) -> Option<&ClassCounts> {
        self.counts.get(topology.0.checked_sub(1)?)?.get(block)
    }

    /// conserved / (conserved + lost), `None` when the block was never below
    /// an origin
    #[must_use]
    pub fn conservation_rate(counts: &ClassCounts) -> Option<f64> {
        let informative = counts.conserved + counts.lost;
        #[allow(clippy::cast_precision_loss)]
        (informative > 0).then(|| counts.conserved as f64 / informative as f64)
    }
}
