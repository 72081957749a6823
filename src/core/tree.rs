//! Arena-backed rooted species tree.
//!
//! Nodes live in a flat `Vec` and refer to each other by index. The root is
//! always node 0. Traversals are iterative so deep, ladder-like reference
//! trees cannot exhaust the stack.

use std::collections::HashSet;

/// Index of a node within its [`SpeciesTree`]
pub type NodeIndex = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub label: Option<String>,
    /// Length of the edge above this node
    pub branch_length: Option<f64>,
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
}

impl TreeNode {
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesTree {
    nodes: Vec<TreeNode>,
}

fn add_lengths(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x + y),
        (x, None) => x,
        (None, y) => y,
    }
}

impl SpeciesTree {
    /// Create a tree holding only a root node
    #[must_use]
    pub fn new(root_label: Option<String>, root_length: Option<f64>) -> Self {
        Self {
            nodes: vec![TreeNode {
                label: root_label,
                branch_length: root_length,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Append a child under `parent` and return its index
    pub fn add_child(
        &mut self,
        parent: NodeIndex,
        label: Option<String>,
        branch_length: Option<f64>,
    ) -> NodeIndex {
        let index = self.nodes.len();
        self.nodes.push(TreeNode {
            label,
            branch_length,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(index);
        index
    }

    #[must_use]
    pub fn root(&self) -> NodeIndex {
        0
    }

    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &TreeNode {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> &mut TreeNode {
        &mut self.nodes[index]
    }

    #[must_use]
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn is_leaf(&self, index: NodeIndex) -> bool {
        self.nodes[index].is_leaf()
    }

    /// Node label or the empty string
    #[must_use]
    pub fn label(&self, index: NodeIndex) -> &str {
        self.nodes[index].label.as_deref().unwrap_or("")
    }

    /// Nodes in preorder, children visited in insertion order
    #[must_use]
    pub fn preorder(&self) -> Vec<NodeIndex> {
        self.preorder_from(self.root())
    }

    /// Preorder of the subtree rooted at `start`
    #[must_use]
    pub fn preorder_from(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![start];
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.nodes[index].children.iter().rev());
        }
        order
    }

    /// Nodes in postorder (every child before its parent)
    #[must_use]
    pub fn postorder(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.nodes[index].children.iter());
        }
        order.reverse();
        order
    }

    /// Leaf indices in preorder
    #[must_use]
    pub fn leaves(&self) -> Vec<NodeIndex> {
        self.preorder()
            .into_iter()
            .filter(|&i| self.is_leaf(i))
            .collect()
    }

    /// Leaf labels in preorder; unlabelled leaves are skipped
    #[must_use]
    pub fn leaf_labels(&self) -> Vec<&str> {
        self.leaves()
            .into_iter()
            .filter_map(|i| self.nodes[i].label.as_deref())
            .collect()
    }

    #[must_use]
    pub fn find_leaf(&self, label: &str) -> Option<NodeIndex> {
        self.nodes
            .iter()
            .position(|n| n.is_leaf() && n.label.as_deref() == Some(label))
    }

    /// Number of leaves in the subtree rooted at `index`
    #[must_use]
    pub fn leaf_count_below(&self, index: NodeIndex) -> usize {
        self.preorder_from(index)
            .into_iter()
            .filter(|&i| self.is_leaf(i))
            .count()
    }

    /// Most recent common ancestor of a set of nodes
    #[must_use]
    pub fn mrca(&self, members: &[NodeIndex]) -> Option<NodeIndex> {
        let (first, rest) = members.split_first()?;

        let mut chain = vec![*first];
        while let Some(parent) = self.nodes[chain[chain.len() - 1]].parent {
            chain.push(parent);
        }

        for &member in rest {
            let mut ancestors = HashSet::new();
            let mut current = Some(member);
            while let Some(index) = current {
                ancestors.insert(index);
                current = self.nodes[index].parent;
            }
            let shared = chain.iter().position(|n| ancestors.contains(n))?;
            chain.drain(..shared);
        }

        chain.first().copied()
    }

    /// Induced subtree over the leaves whose labels are in `keep`.
    ///
    /// Internal nodes left with a single retained child are suppressed and
    /// their branch lengths folded into the child's edge. The returned root has
    /// no branch length. Returns `None` when no leaf is kept.
    #[must_use]
    pub fn restrict(&self, keep: &HashSet<&str>) -> Option<SpeciesTree> {
        let mut kept_below = vec![false; self.nodes.len()];
        for index in self.postorder() {
            let node = &self.nodes[index];
            kept_below[index] = if node.is_leaf() {
                node.label.as_deref().is_some_and(|l| keep.contains(l))
            } else {
                node.children.iter().any(|&c| kept_below[c])
            };
        }
        if !kept_below[self.root()] {
            return None;
        }

        let mut restricted: Option<SpeciesTree> = None;
        // (old node, new parent, accumulated length of the edge above)
        let mut stack: Vec<(NodeIndex, Option<NodeIndex>, Option<f64>)> =
            vec![(self.root(), None, None)];

        while let Some((index, new_parent, length)) = stack.pop() {
            let node = &self.nodes[index];
            let kept_children: Vec<NodeIndex> = node
                .children
                .iter()
                .copied()
                .filter(|&c| kept_below[c])
                .collect();

            if kept_children.len() == 1 {
                let child = kept_children[0];
                let folded = add_lengths(length, self.nodes[child].branch_length);
                stack.push((child, new_parent, folded));
                continue;
            }

            let new_index = match (&mut restricted, new_parent) {
                (Some(tree), Some(parent)) => tree.add_child(parent, node.label.clone(), length),
                _ => {
                    restricted = Some(SpeciesTree::new(node.label.clone(), None));
                    0
                }
            };

            for &child in kept_children.iter().rev() {
                stack.push((child, Some(new_index), self.nodes[child].branch_length));
            }
        }

        restricted
    }

    /// Copy `other` under `parent`, returning the index of its root in `self`
    pub fn append_subtree(&mut self, parent: NodeIndex, other: &SpeciesTree) -> NodeIndex {
        let mut mapping = vec![0; other.len()];
        for index in other.preorder() {
            let node = other.node(index);
            let new_parent = node.parent.map_or(parent, |p| mapping[p]);
            mapping[index] = self.add_child(new_parent, node.label.clone(), node.branch_length);
        }
        mapping[other.root()]
    }

    /// Serialize to Newick text, terminated by `;`
    #[must_use]
    pub fn to_newick(&self) -> String {
        enum Step {
            Enter(NodeIndex),
            Exit(NodeIndex),
            Comma,
        }

        let mut out = String::new();
        let mut stack = vec![Step::Enter(self.root())];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(index) if self.is_leaf(index) => self.write_node_suffix(index, &mut out),
                Step::Enter(index) => {
                    out.push('(');
                    stack.push(Step::Exit(index));
                    let children = &self.nodes[index].children;
                    for (i, &child) in children.iter().enumerate().rev() {
                        stack.push(Step::Enter(child));
                        if i > 0 {
                            stack.push(Step::Comma);
                        }
                    }
                }
                Step::Exit(index) => {
                    out.push(')');
                    self.write_node_suffix(index, &mut out);
                }
                Step::Comma => out.push(','),
            }
        }
        out.push(';');
        out
    }

    fn write_node_suffix(&self, index: NodeIndex, out: &mut String) {
        let node = &self.nodes[index];
        if let Some(label) = &node.label {
            out.push_str(&format_newick_label(label));
        }
        if let Some(length) = node.branch_length {
            out.push(':');
            out.push_str(&length.to_string());
        }
    }
}

/// Quote a label when it contains Newick metacharacters
#[must_use]
pub fn format_newick_label(label: &str) -> String {
    let needs_quotes = label
        .chars()
        .any(|c| c.is_whitespace() || "()[]':;,".contains(c));
    if needs_quotes {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ((A:1,B:2)AB:3,(C:1,D:1):1);
    fn sample_tree() -> SpeciesTree {
        let mut tree = SpeciesTree::new(None, None);
        let ab = tree.add_child(0, Some("AB".to_string()), Some(3.0));
        tree.add_child(ab, Some("A".to_string()), Some(1.0));
        tree.add_child(ab, Some("B".to_string()), Some(2.0));
        let cd = tree.add_child(0, None, Some(1.0));
        tree.add_child(cd, Some("C".to_string()), Some(1.0));
        tree.add_child(cd, Some("D".to_string()), Some(1.0));
        tree
    }

    #[test]
    fn test_traversals() {
        let tree = sample_tree();
        assert_eq!(tree.preorder(), vec![0, 1, 2, 3, 4, 5, 6]);
        let post = tree.postorder();
        assert_eq!(post.last(), Some(&0));
        for index in 1..tree.len() {
            let parent = tree.node(index).parent.unwrap();
            let child_pos = post.iter().position(|&i| i == index).unwrap();
            let parent_pos = post.iter().position(|&i| i == parent).unwrap();
            assert!(child_pos < parent_pos);
        }
        assert_eq!(tree.leaf_labels(), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_to_newick() {
        let tree = sample_tree();
        assert_eq!(tree.to_newick(), "((A:1,B:2)AB:3,(C:1,D:1):1);");
    }

    #[test]
    fn test_newick_label_quoting() {
        assert_eq!(format_newick_label("Homo_sapiens"), "Homo_sapiens");
        assert_eq!(format_newick_label("Homo sapiens"), "'Homo sapiens'");
        assert_eq!(format_newick_label("it's"), "'it''s'");
    }

    #[test]
    fn test_mrca() {
        let tree = sample_tree();
        let a = tree.find_leaf("A").unwrap();
        let b = tree.find_leaf("B").unwrap();
        let c = tree.find_leaf("C").unwrap();
        assert_eq!(tree.mrca(&[a, b]), Some(1));
        assert_eq!(tree.mrca(&[a, c]), Some(0));
        assert_eq!(tree.mrca(&[a]), Some(a));
        assert_eq!(tree.mrca(&[]), None);
        assert_eq!(tree.leaf_count_below(1), 2);
    }

    #[test]
    fn test_restrict_suppresses_unary_nodes() {
        let tree = sample_tree();
        let keep: HashSet<&str> = ["A", "C", "D"].into_iter().collect();
        let restricted = tree.restrict(&keep).unwrap();
        // AB collapses into A, with lengths 3 + 1
        assert_eq!(restricted.to_newick(), "(A:4,(C:1,D:1):1);");
    }

    #[test]
    fn test_restrict_single_leaf_and_none() {
        let tree = sample_tree();
        let keep: HashSet<&str> = ["B"].into_iter().collect();
        let restricted = tree.restrict(&keep).unwrap();
        assert_eq!(restricted.len(), 1);
        assert_eq!(restricted.to_newick(), "B;");

        let keep: HashSet<&str> = ["Z"].into_iter().collect();
        assert!(tree.restrict(&keep).is_none());
    }

    #[test]
    fn test_append_subtree() {
        let mut host = SpeciesTree::new(Some("top".to_string()), None);
        let sub = sample_tree();
        let attached = host.append_subtree(0, &sub);
        assert_eq!(attached, 1);
        assert_eq!(host.len(), 1 + sub.len());
        assert_eq!(host.to_newick(), "(((A:1,B:2)AB:3,(C:1,D:1):1))top;");
    }
}
