/// Filesystem attributes of a single scanned node, for a details panel.
use crate::error::DetailsError;
use crate::model::{FileTree, NodeIndex};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

/// Attributes read fresh from disk for one real node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeDetails {
    pub path: PathBuf,
    pub is_dir: bool,
    pub is_symlink: bool,
    /// Size reported by the filesystem now (for directories this is the
    /// entry itself, not the aggregated tree size).
    pub size_on_disk: u64,
    /// Aggregated size recorded in the tree.
    pub tree_size: u64,
    pub created: Option<DateTime<Local>>,
    pub modified: Option<DateTime<Local>>,
    pub accessed: Option<DateTime<Local>>,
    pub readonly: bool,
    pub hidden: bool,
    pub permissions: Access,
}

/// Read/write/execute flags. On Unix these are "any class has the bit"
/// from the mode; elsewhere they are derived from the read-only attribute
/// and the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Access {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

/// Read the current filesystem attributes of `index`.
///
/// Synthetic nodes are refused: they have no single path to inspect.
pub fn node_details(tree: &FileTree, index: NodeIndex) -> Result<NodeDetails, DetailsError> {
    let node = tree.node(index);
    if node.is_synthetic {
        return Err(DetailsError::Synthetic(node.name.to_string()));
    }

    let meta = fs::symlink_metadata(&node.path).map_err(|source| DetailsError::Io {
        path: node.path.clone(),
        source,
    })?;

    Ok(NodeDetails {
        path: node.path.clone(),
        is_dir: meta.is_dir(),
        is_symlink: meta.file_type().is_symlink(),
        size_on_disk: meta.len(),
        tree_size: node.size,
        created: local_time(meta.created()),
        modified: local_time(meta.modified()),
        accessed: local_time(meta.accessed()),
        readonly: meta.permissions().readonly(),
        hidden: is_hidden(&node.name, &meta),
        permissions: access(&node.name, &meta),
    })
}

fn local_time(time: std::io::Result<SystemTime>) -> Option<DateTime<Local>> {
    time.ok().map(DateTime::<Local>::from)
}

#[cfg(windows)]
fn is_hidden(_name: &str, meta: &fs::Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    meta.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0
}

#[cfg(not(windows))]
fn is_hidden(name: &str, _meta: &fs::Metadata) -> bool {
    name.starts_with('.')
}

#[cfg(unix)]
fn access(_name: &str, meta: &fs::Metadata) -> Access {
    use std::os::unix::fs::PermissionsExt;
    let mode = meta.permissions().mode();
    Access {
        read: mode & 0o444 != 0,
        write: mode & 0o222 != 0,
        execute: mode & 0o111 != 0,
    }
}

#[cfg(not(unix))]
fn access(name: &str, meta: &fs::Metadata) -> Access {
    let executable = meta.is_dir()
        || crate::analysis::file_types::extension_of(name)
            .is_some_and(|ext| matches!(ext.as_str(), "exe" | "com" | "bat" | "cmd" | "ps1"));
    Access {
        read: true,
        write: !meta.permissions().readonly(),
        execute: executable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileNode;
    use compact_str::CompactString;
    use std::io::Write;

    #[test]
    fn reads_real_file_attributes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("notes.txt");
        fs::File::create(&path).unwrap().write_all(b"hello").unwrap();

        let mut tree = FileTree::with_capacity(1);
        let idx = tree.add_root(FileNode::new_file(CompactString::new("notes.txt"), path, 5));

        let details = node_details(&tree, idx).unwrap();
        assert!(!details.is_dir);
        assert_eq!(details.size_on_disk, 5);
        assert_eq!(details.tree_size, 5);
        assert!(details.modified.is_some());
        assert!(!details.hidden);
        assert!(details.permissions.read);
        assert!(details.permissions.write);
    }

    #[cfg(unix)]
    #[test]
    fn permission_bits_are_reported() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let script = tmp.path().join("run.sh");
        let frozen = tmp.path().join("frozen.txt");
        fs::write(&script, b"#!/bin/sh").unwrap();
        fs::write(&frozen, b"x").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        fs::set_permissions(&frozen, fs::Permissions::from_mode(0o444)).unwrap();

        let mut tree = FileTree::with_capacity(3);
        let root = tree.add_root(FileNode::new_dir(
            CompactString::new("tmp"),
            tmp.path().to_path_buf(),
        ));
        let s = tree.add_node(FileNode::new_file(CompactString::new("run.sh"), script, 9));
        tree.add_child(root, s);
        let f = tree.add_node(FileNode::new_file(CompactString::new("frozen.txt"), frozen, 1));
        tree.add_child(root, f);

        let run = node_details(&tree, s).unwrap().permissions;
        assert_eq!(
            run,
            Access {
                read: true,
                write: true,
                execute: true
            }
        );

        let details = node_details(&tree, f).unwrap();
        assert!(details.readonly);
        assert_eq!(
            details.permissions,
            Access {
                read: true,
                write: false,
                execute: false
            }
        );
    }

    #[test]
    fn dot_files_are_hidden_on_unix() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(".profile");
        fs::write(&path, b"").unwrap();

        let mut tree = FileTree::with_capacity(1);
        let idx = tree.add_root(FileNode::new_file(CompactString::new(".profile"), path, 0));
        let details = node_details(&tree, idx).unwrap();
        assert_eq!(details.hidden, cfg!(not(windows)));
    }

    #[test]
    fn synthetic_node_is_refused() {
        let mut tree = FileTree::with_capacity(1);
        let idx = tree.add_root(FileNode::new_synthetic(
            CompactString::new("Images"),
            PathBuf::from("/"),
            1,
        ));
        assert!(matches!(
            node_details(&tree, idx),
            Err(DetailsError::Synthetic(_))
        ));
    }

    #[test]
    fn vanished_path_is_an_io_error() {
        let mut tree = FileTree::with_capacity(1);
        let idx = tree.add_root(FileNode::new_file(
            CompactString::new("ghost"),
            PathBuf::from("/definitely/not/here/ghost"),
            1,
        ));
        assert!(matches!(
            node_details(&tree, idx),
            Err(DetailsError::Io { .. })
        ));
    }
}
