/// sizescope core: scanning, mutation, analysis and the data model.
///
/// This crate contains all business logic with zero UI dependencies.
/// It is designed to be reusable across different frontends (GUI, CLI, TUI).
///
/// # Modules
///
/// - [`model`]: Arena-allocated file tree and size formatting.
/// - [`scanner`]: Parallel fork/join directory scanner with live progress counters.
/// - [`mutate`]: Deletion of scanned nodes with ancestor size propagation.
/// - [`analysis`]: Post-scan views (file-type categories, node details).
/// - [`config`]: JSON configuration for scanning and categorisation.
/// - [`error`]: Error types surfaced to callers.
pub mod analysis;
pub mod config;
pub mod error;
pub mod model;
pub mod mutate;
pub mod scanner;

pub use error::{ConfigError, DeleteError, DetailsError, ScanError};
pub use model::{format_size, FileNode, FileTree, NodeIndex};
pub use mutate::{delete, Deletion, SharedTree};
pub use scanner::{scan, start_scan, ScanHandle, ScanOptions, ScanProgress};
