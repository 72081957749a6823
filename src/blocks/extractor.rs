use crate::core::clade::CladeAssignment;
use crate::core::species_set::SpeciesSet;
use crate::core::tree::{NodeIndex, SpeciesTree};
use crate::core::types::TopologyId;
use crate::grafting::StructuralError;
use crate::utils::validation::{BLOCK_ID_SEPARATOR, ROOT_SENTINEL};

/// A parent-to-child edge of a full species tree
#[derive(Debug, Clone, PartialEq)]
pub struct PhylogeneticBlock {
    /// Position in the block table (preorder of child nodes)
    pub index: usize,
    pub parent_label: String,
    pub child_label: String,
    pub child_node: NodeIndex,
    /// Block entering the parent node; `None` for the root sentinel
    pub parent_block: Option<usize>,
    pub children: Vec<usize>,
    /// Root sentinel has depth 0
    pub depth: usize,
    pub is_terminal: bool,
    /// Species below the child node
    pub descendants: SpeciesSet,
    /// Clades with species below the child node, joined by `+`
    pub clade_span: String,
}

impl PhylogeneticBlock {
    /// `parent::child`, e.g. `ROOT::Vertebrata+Mollusca+Outgroup`
    #[must_use]
    pub fn id(&self) -> String {
        format!(
            "{}{BLOCK_ID_SEPARATOR}{}",
            self.parent_label, self.child_label
        )
    }

    #[must_use]
    pub fn is_root_sentinel(&self) -> bool {
        self.parent_block.is_none()
    }
}

/// Every block of one full species tree, root sentinel first
#[derive(Debug, Clone)]
pub struct BlockTable {
    pub topology: TopologyId,
    pub blocks: Vec<PhylogeneticBlock>,
}

impl BlockTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The root sentinel block
    #[must_use]
    pub fn root(&self) -> Option<&PhylogeneticBlock> {
        self.blocks.first()
    }

    /// Block indices of the subtree rooted at `index`, in preorder
    #[must_use]
    pub fn subtree(&self, index: usize) -> Vec<usize> {
        let mut order = Vec::new();
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            order.push(i);
            stack.extend(self.blocks[i].children.iter().rev());
        }
        order
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&PhylogeneticBlock> {
        self.blocks.iter().find(|b| b.id() == id)
    }
}

/// Decompose a full species tree into its phylogenetic blocks.
///
/// Descendant sets are accumulated bottom-up; blocks are emitted in preorder
/// so a block's parent always precedes it. Every node owns the block entering
/// it, with the root owning the `ROOT::<root>` sentinel.
///
/// # Errors
///
/// Returns `StructuralError::UnlabeledNode` for a node without a label, or
/// `StructuralError::UnknownLeaf` for a leaf outside the master species list.
pub fn extract_blocks(
    tree: &SpeciesTree,
    assignment: &CladeAssignment,
    topology: TopologyId,
) -> Result<BlockTable, StructuralError> {
    let mut descendants: Vec<SpeciesSet> = vec![assignment.empty_set(); tree.len()];
    for index in tree.postorder() {
        let node = tree.node(index);
        if node.is_leaf() {
            let label = node
                .label
                .as_deref()
                .ok_or(StructuralError::UnlabeledNode("leaf"))?;
            let species = assignment
                .species_index(label)
                .ok_or_else(|| StructuralError::UnknownLeaf(label.to_string()))?;
            descendants[index].insert(species);
        } else {
            let mut set = assignment.empty_set();
            for &child in &node.children {
                set.union_with(&descendants[child]);
            }
            descendants[index] = set;
        }
    }

    let order = tree.preorder();
    let mut block_of = vec![0usize; tree.len()];
    let mut blocks: Vec<PhylogeneticBlock> = Vec::with_capacity(order.len());

    for (index, &node_index) in order.iter().enumerate() {
        let node = tree.node(node_index);
        let child_label = node
            .label
            .clone()
            .ok_or(StructuralError::UnlabeledNode("internal"))?;

        let (parent_label, parent_block, depth) = match node.parent {
            Some(parent) => {
                let parent_block = block_of[parent];
                (
                    tree.label(parent).to_string(),
                    Some(parent_block),
                    blocks[parent_block].depth + 1,
                )
            }
            None => (ROOT_SENTINEL.to_string(), None, 0),
        };

        block_of[node_index] = index;
        if let Some(parent_block) = parent_block {
            blocks[parent_block].children.push(index);
        }

        let set = descendants[node_index].clone();
        blocks.push(PhylogeneticBlock {
            index,
            parent_label,
            child_label,
            child_node: node_index,
            parent_block,
            children: Vec::new(),
            depth,
            is_terminal: node.is_leaf(),
            clade_span: assignment.clade_span_label(&set),
            descendants: set,
        });
    }

    tracing::debug!(topology = %topology, blocks = blocks.len(), "Extracted blocks");
    Ok(BlockTable { topology, blocks })
}
