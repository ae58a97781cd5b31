/// Arena-backed file tree with ordered, size-sorted children.
///
/// All nodes live in a single `Vec<FileNode>`. Relationships between nodes
/// use `NodeIndex` (a thin `u32` wrapper) rather than heap pointers; the
/// `children` vectors own the structure and `parent` is only used to walk
/// upward (ancestor size updates, breadcrumbs).
use super::file_node::{FileNode, NodeIndex};
use std::path::Path;

/// The complete file tree produced by a scan.
#[derive(Debug, Clone, Default)]
pub struct FileTree {
    /// Arena: every node ever allocated, including detached ones.
    pub nodes: Vec<FileNode>,

    /// Scan root. `None` once the root itself has been deleted.
    root: Option<NodeIndex>,
}

impl FileTree {
    /// Create an empty tree with pre-allocated capacity.
    pub fn with_capacity(estimated_nodes: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(estimated_nodes),
            root: None,
        }
    }

    /// Allocate a new node in the arena and return its index.
    pub fn add_node(&mut self, node: FileNode) -> NodeIndex {
        let idx = NodeIndex::new(self.nodes.len());
        self.nodes.push(node);
        idx
    }

    /// Allocate a parentless node and make it the root of the tree.
    pub fn add_root(&mut self, node: FileNode) -> NodeIndex {
        let idx = self.add_node(node);
        self.root = Some(idx);
        idx
    }

    /// Attach `child` as the last child of `parent`.
    ///
    /// Sizes are not touched; trees assembled node by node are finished with
    /// [`aggregate_sizes`](Self::aggregate_sizes).
    pub fn add_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        self.nodes[child.idx()].parent = Some(parent);
        self.nodes[parent.idx()].children.push(child);
    }

    /// Recompute every directory size from its children and sort all
    /// child lists, in a single bottom-up pass.
    ///
    /// Children are always inserted after their parent in the arena, so
    /// iterating in *reverse* processes every child before its parent.
    pub fn aggregate_sizes(&mut self) {
        for node in self.nodes.iter_mut() {
            if node.is_dir && !node.removed {
                node.size = 0;
            }
        }

        for i in (0..self.nodes.len()).rev() {
            if self.nodes[i].removed {
                continue;
            }
            let size = self.nodes[i].size;
            if let Some(parent) = self.nodes[i].parent {
                self.nodes[parent.idx()].size += size;
            }
        }

        for i in 0..self.nodes.len() {
            if self.nodes[i].is_dir {
                self.sort_children(NodeIndex::new(i));
            }
        }
    }

    /// Stable sort of `parent`'s children by size descending. Equal sizes
    /// keep their current relative order.
    pub fn sort_children(&mut self, parent: NodeIndex) {
        let mut children = std::mem::take(&mut self.nodes[parent.idx()].children);
        children.sort_by(|a, b| self.nodes[b.idx()].size.cmp(&self.nodes[a.idx()].size));
        self.nodes[parent.idx()].children = children;
    }

    /// Scan root, if the tree still has one.
    #[inline]
    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    /// Get the node at the given index.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> &FileNode {
        &self.nodes[index.idx()]
    }

    /// Direct children of a node, largest first.
    #[inline]
    pub fn children(&self, index: NodeIndex) -> &[NodeIndex] {
        &self.nodes[index.idx()].children
    }

    /// Real filesystem path of a node.
    #[inline]
    pub fn path(&self, index: NodeIndex) -> &Path {
        &self.nodes[index.idx()].path
    }

    /// Locate the node for an absolute `path` by walking down from the root
    /// one name at a time. Paths outside the root, or folded into an
    /// aggregate, yield `None`.
    pub fn find(&self, path: &Path) -> Option<NodeIndex> {
        let root = self.root?;
        let rest = path.strip_prefix(&self.nodes[root.idx()].path).ok()?;
        let mut current = root;
        for component in rest.components() {
            let name = component.as_os_str().to_string_lossy();
            current = self.children(current).iter().copied().find(|&c| {
                let node = &self.nodes[c.idx()];
                node.is_real() && node.name.as_str() == &*name
            })?;
        }
        Some(current)
    }

    /// `true` if the node is still reachable from the root.
    #[inline]
    pub fn is_attached(&self, index: NodeIndex) -> bool {
        index.idx() < self.nodes.len() && !self.nodes[index.idx()].removed && self.root.is_some()
    }

    /// Breadcrumb chain from the root down to (and including) `index`.
    pub fn ancestors(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = Vec::new();
        let mut current = Some(index);
        while let Some(idx) = current {
            chain.push(idx);
            current = self.nodes[idx.idx()].parent;
        }
        chain.reverse();
        chain
    }

    /// Percentage (0.0–100.0) of the parent's size taken by this node.
    /// The root is 100% of itself; any zero-size parent yields 0.0.
    pub fn share_of_parent(&self, index: NodeIndex) -> f32 {
        let node = &self.nodes[index.idx()];
        let denominator = node
            .parent
            .map(|p| self.nodes[p.idx()].size)
            .unwrap_or(node.size);
        if denominator == 0 {
            0.0
        } else {
            (node.size as f64 / denominator as f64 * 100.0) as f32
        }
    }

    /// Pre-order traversal of `index` and everything below it.
    pub fn descendants(&self, index: NodeIndex) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![index],
        }
    }

    /// Number of real files at or below `index`.
    pub fn descendant_file_count(&self, index: NodeIndex) -> u64 {
        self.descendants(index)
            .filter(|&i| {
                let n = self.node(i);
                !n.is_dir && n.is_real()
            })
            .count() as u64
    }

    /// Number of nodes reachable from the root.
    pub fn reachable_len(&self) -> usize {
        self.root.map_or(0, |r| self.descendants(r).count())
    }

    /// Returns `true` if the tree has no reachable nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Unlink `index` from the tree and propagate the size loss upward.
    ///
    /// Every ancestor's size is decremented by the node's size and each
    /// ancestor is re-positioned among its own siblings so that every
    /// `children` list stays sorted. Detaching the root empties the tree.
    /// Returns the number of bytes removed from the tree.
    pub fn detach(&mut self, index: NodeIndex) -> u64 {
        let freed = self.nodes[index.idx()].size;
        let parent = self.nodes[index.idx()].parent;

        let doomed: Vec<NodeIndex> = self.descendants(index).collect();
        for idx in doomed {
            self.nodes[idx.idx()].removed = true;
        }

        let Some(parent) = parent else {
            self.root = None;
            return freed;
        };

        // Removing one element keeps the direct parent's list sorted.
        self.nodes[parent.idx()].children.retain(|&c| c != index);
        self.nodes[index.idx()].parent = None;

        let mut current = Some(parent);
        while let Some(idx) = current {
            let node = &mut self.nodes[idx.idx()];
            node.size = node.size.saturating_sub(freed);
            current = node.parent;
            if let Some(grandparent) = current {
                self.sort_children(grandparent);
            }
        }

        freed
    }
}

/// Iterator returned by [`FileTree::descendants`].
pub struct Descendants<'a> {
    tree: &'a FileTree,
    stack: Vec<NodeIndex>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let idx = self.stack.pop()?;
        // Reverse push so the largest child is visited first.
        self.stack
            .extend(self.tree.children(idx).iter().rev().copied());
        Some(idx)
    }
}
