use std::collections::HashMap;

use crate::core::tree::format_newick_label;
use crate::core::types::CladeId;

/// A rooted bifurcating arrangement of clades as nested bipartitions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topology {
    Leaf(CladeId),
    Split(Box<Topology>, Box<Topology>),
}

/// Step taken from a split towards one of its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// Path from the root to a node; the node's parent edge is an insertion point
pub type InsertionPoint = Vec<Side>;

impl Topology {
    pub fn leaf(clade: impl Into<String>) -> Self {
        Self::Leaf(CladeId::new(clade))
    }

    #[must_use]
    pub fn join(left: Topology, right: Topology) -> Self {
        Self::Split(Box::new(left), Box::new(right))
    }

    /// Clades left to right
    #[must_use]
    pub fn leaves(&self) -> Vec<&CladeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Leaf(clade) => leaves.push(clade),
                Self::Split(left, right) => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        leaves
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    /// Every node's path from the root, root first.
    ///
    /// Inserting a clade above any of these nodes yields a distinct topology, so
    /// a k-clade topology has 2k-1 insertion points (the edge above the root
    /// included).
    #[must_use]
    pub fn insertion_points(&self) -> Vec<InsertionPoint> {
        let mut points = Vec::new();
        let mut worklist: Vec<(&Topology, InsertionPoint)> = vec![(self, Vec::new())];
        while let Some((node, path)) = worklist.pop() {
            if let Self::Split(left, right) = node {
                let mut right_path = path.clone();
                right_path.push(Side::Right);
                worklist.push((&**right, right_path));
                let mut left_path = path.clone();
                left_path.push(Side::Left);
                worklist.push((&**left, left_path));
            }
            points.push(path);
        }
        points
    }

    /// New topology with `clade` attached as sister to the node at `point`.
    ///
    /// Returns `None` if the path walks past a leaf.
    #[must_use]
    pub fn insert_at(&self, point: &[Side], clade: &CladeId) -> Option<Topology> {
        let mut result = self.clone();
        let mut cursor = &mut result;
        for side in point {
            let current = cursor;
            cursor = match current {
                Self::Split(left, right) => match side {
                    Side::Left => &mut **left,
                    Side::Right => &mut **right,
                },
                Self::Leaf(_) => return None,
            };
        }
        let displaced = std::mem::replace(cursor, Self::Leaf(clade.clone()));
        *cursor = Self::join(displaced, Self::Leaf(clade.clone()));
        Some(result)
    }

    /// Canonical form: every split's children ordered by the lowest clade rank
    /// they contain. Clades missing from `rank` sort last, by name.
    #[must_use]
    pub fn canonical(&self, rank: &HashMap<CladeId, usize>) -> Topology {
        self.canonical_with_key(rank).0
    }

    fn canonical_with_key(&self, rank: &HashMap<CladeId, usize>) -> (Topology, (usize, String)) {
        match self {
            Self::Leaf(clade) => {
                let key = (
                    rank.get(clade).copied().unwrap_or(usize::MAX),
                    clade.0.clone(),
                );
                (self.clone(), key)
            }
            Self::Split(left, right) => {
                let (left, left_key) = left.canonical_with_key(rank);
                let (right, right_key) = right.canonical_with_key(rank);
                if right_key < left_key {
                    (Self::join(right, left), right_key)
                } else {
                    (Self::join(left, right), left_key)
                }
            }
        }
    }

    /// Clade-level Newick text, e.g. `((Vertebrata,Mollusca),Outgroup);`
    #[must_use]
    pub fn to_newick(&self) -> String {
        let mut out = self.newick_body();
        out.push(';');
        out
    }

    fn newick_body(&self) -> String {
        match self {
            Self::Leaf(clade) => format_newick_label(clade.as_str()),
            Self::Split(left, right) => {
                format!("({},{})", left.newick_body(), right.newick_body())
            }
        }
    }

    /// Clade pairs that are sisters (two leaves under one split)
    #[must_use]
    pub fn sister_pairs(&self) -> Vec<(&CladeId, &CladeId)> {
        let mut pairs = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Self::Split(left, right) = node {
                if let (Self::Leaf(a), Self::Leaf(b)) = (left.as_ref(), right.as_ref()) {
                    pairs.push((a, b));
                }
                stack.push(right);
                stack.push(left);
            }
        }
        pairs
    }
}
