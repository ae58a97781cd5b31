/// Data model for the sizescope file tree.
///
/// Re-exports the arena-allocated tree structure and supporting types.
pub mod file_node;
pub mod file_tree;
pub mod size;

pub use file_node::{FileNode, NodeIndex, OTHER_FILES_NAME};
pub use file_tree::{Descendants, FileTree};
pub use size::{format_count, format_size};
