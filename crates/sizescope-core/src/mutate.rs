/// Post-scan tree mutation: deleting a node from disk and from the tree.
///
/// The tree is shared with the presentation layer through a [`SharedTree`].
/// A deletion holds an *upgradable* read lock while the filesystem work runs,
/// so readers keep rendering but no second mutation can interleave. Only
/// after the physical delete succeeds is the lock upgraded and the tree
/// changed, in one critical section: readers never see a node unlinked
/// without its ancestors shrunk, or the reverse.
use crate::error::DeleteError;
use crate::model::{FileTree, NodeIndex};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A scanned tree that one thread may read while another mutates it.
pub type SharedTree = Arc<RwLock<FileTree>>;

/// Outcome of a successful [`delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    /// The node was unlinked and every ancestor shrank by `freed` bytes.
    Detached { freed: u64 },
    /// The scan root itself was deleted. The tree is now empty and the
    /// caller should return to an unscanned state.
    RootRemoved { freed: u64 },
}

impl Deletion {
    pub fn freed(self) -> u64 {
        match self {
            Self::Detached { freed } | Self::RootRemoved { freed } => freed,
        }
    }
}

/// Delete `index` from disk, then from the tree.
///
/// Directories are removed recursively, deepest entries first. On any
/// filesystem failure the tree is left exactly as it was.
pub fn delete(tree: &SharedTree, index: NodeIndex) -> Result<Deletion, DeleteError> {
    let guard = tree.upgradable_read();

    if !guard.is_attached(index) {
        return Err(DeleteError::Detached);
    }
    let node = guard.node(index);
    if node.is_synthetic {
        return Err(DeleteError::Synthetic(node.name.to_string()));
    }

    remove_from_disk(&node.path, node.is_dir)?;
    let is_root = node.parent.is_none();
    let path = node.path.clone();

    let mut tree = RwLockUpgradableReadGuard::upgrade(guard);
    let freed = tree.detach(index);
    drop(tree);

    info!("Deleted {} ({} bytes)", path.display(), freed);
    Ok(if is_root {
        Deletion::RootRemoved { freed }
    } else {
        Deletion::Detached { freed }
    })
}

/// Physically remove a file, or a directory and everything below it.
fn remove_from_disk(path: &Path, is_dir: bool) -> Result<(), DeleteError> {
    let result = if is_dir {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|source| DeleteError::Io {
        path: path.to_path_buf(),
        source,
    })
}
