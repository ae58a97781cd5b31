/// A single node in the arena-allocated file tree.
///
/// Nodes are stored in a flat `Vec<FileNode>` owned by [`FileTree`](super::FileTree).
/// The downward `children` list is the owning side of the relationship; the
/// upward `parent` link is a plain index and never participates in ownership,
/// so cycles cannot form.
use compact_str::CompactString;
use std::path::PathBuf;

/// Lightweight index into the arena `Vec<FileNode>`.
///
/// Uses `u32` to keep nodes small; supports up to ~4 billion nodes,
/// which is more than enough for any real filesystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Create a new `NodeIndex` from a `usize`, panicking if it exceeds `u32::MAX`.
    #[inline]
    pub fn new(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(index) => Self(index),
            Err(_) => panic!("NodeIndex overflow: arena holds more than u32::MAX nodes"),
        }
    }

    /// Return the index as a `usize` for Vec indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Display name given to the aggregate that absorbs truncated children.
pub const OTHER_FILES_NAME: &str = "[Other Files]";

/// A single file, directory, or synthetic aggregate in the tree.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// Final path segment (or the full path for a drive/filesystem root).
    pub name: CompactString,

    /// Absolute filesystem path. Synthetic nodes reuse their owner's path
    /// and must never be used for I/O.
    pub path: PathBuf,

    /// Logical size in bytes. For directories this is the sum of the
    /// retained children's sizes.
    pub size: u64,

    /// `true` if this node represents a directory.
    pub is_dir: bool,

    /// `true` for the "Other" overflow aggregate and for category buckets.
    pub is_synthetic: bool,

    /// Index of the owning directory. `None` for the scan root and for
    /// free-standing category buckets.
    pub parent: Option<NodeIndex>,

    /// Children ordered by size descending.
    pub children: Vec<NodeIndex>,

    /// Set once the node has been detached from the tree by a deletion.
    /// The arena slot stays allocated but is unreachable from the root.
    pub removed: bool,
}

impl FileNode {
    /// Create a new file node with the given name and size.
    pub fn new_file(name: CompactString, path: PathBuf, size: u64) -> Self {
        Self {
            name,
            path,
            size,
            is_dir: false,
            is_synthetic: false,
            parent: None,
            children: Vec::new(),
            removed: false,
        }
    }

    /// Create a new, empty directory node.
    pub fn new_dir(name: CompactString, path: PathBuf) -> Self {
        Self {
            is_dir: true,
            ..Self::new_file(name, path, 0)
        }
    }

    /// Create a synthetic leaf (overflow aggregate or category bucket).
    pub fn new_synthetic(name: CompactString, path: PathBuf, size: u64) -> Self {
        Self {
            is_synthetic: true,
            ..Self::new_file(name, path, size)
        }
    }

    /// `true` if this node is backed by exactly one real filesystem object.
    #[inline]
    pub fn is_real(&self) -> bool {
        !self.is_synthetic
    }
}
