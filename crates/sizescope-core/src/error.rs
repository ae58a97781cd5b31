/// Error types surfaced to callers of the core.
///
/// Only whole-operation failures appear here. I/O errors local to one
/// scanned entry or directory are absorbed inside the scanner and never
/// reach these types.
use std::path::PathBuf;
use thiserror::Error;

/// Failure to start a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The requested root does not exist (or its metadata is unreadable).
    #[error("scan root {path} is not accessible: {source}")]
    RootNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested root exists but is a file or other non-directory.
    #[error("scan root {0} is not a directory")]
    NotADirectory(PathBuf),

    /// The worker pool or background thread could not be created.
    #[error("failed to start scan workers: {0}")]
    Workers(String),
}

/// Failure to delete a node.
///
/// Whenever one of these is returned the tree has not been modified.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// Synthetic aggregates do not correspond to one filesystem object.
    #[error("'{0}' is an aggregate and cannot be deleted")]
    Synthetic(String),

    /// The node was already removed from the tree (or the tree was emptied).
    #[error("node is no longer part of the tree")]
    Detached,

    /// The filesystem refused the delete.
    #[error("failed to delete {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to read filesystem details for a node.
#[derive(Debug, Error)]
pub enum DetailsError {
    /// Synthetic aggregates have no real path to inspect.
    #[error("'{0}' is an aggregate and has no filesystem details")]
    Synthetic(String),

    #[error("failed to read metadata for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to load configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
