//! Fixed-width bitset over master species indices.

#[inline]
const fn bit_position(index: usize) -> (usize, u64) {
    (index >> 6, 1u64 << (index & 0x3f))
}

/// A set of species, stored as one bit per species in the master list.
///
/// All sets compared with each other must be created with the same capacity
/// (the master species count).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpeciesSet {
    words: Vec<u64>,
    capacity: usize,
}

impl SpeciesSet {
    /// Create an empty set able to hold `capacity` species
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
            capacity,
        }
    }

    /// Create a set with every species in the master list
    #[must_use]
    pub fn full(capacity: usize) -> Self {
        let mut set = Self::with_capacity(capacity);
        for index in 0..capacity {
            set.insert(index);
        }
        set
    }

    pub fn from_indices(capacity: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut set = Self::with_capacity(capacity);
        for index in indices {
            set.insert(index);
        }
        set
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add a species. Indices beyond capacity are ignored.
    pub fn insert(&mut self, index: usize) {
        if index < self.capacity {
            let (word, mask) = bit_position(index);
            self.words[word] |= mask;
        }
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        if index >= self.capacity {
            return false;
        }
        let (word, mask) = bit_position(index);
        self.words[word] & mask != 0
    }

    /// Number of species in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Union in place
    pub fn union_with(&mut self, other: &Self) {
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= *b;
        }
    }

    /// True when every species of `self` is also in `other`
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .all(|(a, b)| a & !b == 0)
    }

    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.words.iter().zip(&other.words).any(|(a, b)| a & b != 0)
    }

    /// Size of the intersection without allocating
    #[must_use]
    pub fn intersection_count(&self, other: &Self) -> usize {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Species indices in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.capacity).filter(move |&i| self.contains(i))
    }
}
