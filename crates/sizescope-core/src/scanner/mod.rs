/// Scanner module: orchestrates filesystem scanning.
///
/// [`scan`] runs the fork/join walker in [`parallel`] on a dedicated rayon
/// pool and returns the finished [`FileTree`]. [`start_scan`] does the same
/// on a background thread so a frontend can poll [`ScanProgress`] while it
/// runs. A started scan always runs to completion; a frontend that loses
/// interest simply drops the handle.
pub mod parallel;
pub mod progress;

pub use progress::{ProgressSnapshot, ScanProgress};

use crate::error::ScanError;
use crate::model::FileTree;
use crossbeam_channel::{Receiver, TryRecvError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::info;

/// Default cap on visible children per directory.
pub const DEFAULT_MAX_CHILDREN: usize = 50;

/// Tunables for a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Worker pool size. `None` uses one worker per logical CPU.
    pub threads: Option<usize>,

    /// Children kept per directory before the rest is folded into
    /// an `[Other Files]` aggregate.
    pub max_children: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            threads: None,
            max_children: DEFAULT_MAX_CHILDREN,
        }
    }
}

impl ScanOptions {
    /// Number of workers the pool will be built with (never zero).
    pub fn worker_count(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// Check that `root` exists and is a directory, returning its absolute form.
///
/// This runs before any worker is created so an invalid root fails fast.
pub fn validate_root(root: &Path) -> Result<PathBuf, ScanError> {
    let meta = std::fs::metadata(root).map_err(|source| ScanError::RootNotFound {
        path: root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    std::path::absolute(root).map_err(|source| ScanError::RootNotFound {
        path: root.to_path_buf(),
        source,
    })
}

/// Scan the directory tree rooted at `root`.
///
/// Resets `progress` first, then updates it continuously from every worker.
/// Once this returns the counters hold the final totals until the next reset.
/// Only an invalid root (or a pool that cannot be built) is an error;
/// unreadable entries and directories inside the tree are skipped.
pub fn scan(
    root: &Path,
    progress: &ScanProgress,
    options: &ScanOptions,
) -> Result<FileTree, ScanError> {
    let root = validate_root(root)?;
    progress.reset();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.worker_count())
        .thread_name(|i| format!("sizescope-scan-{i}"))
        .build()
        .map_err(|e| ScanError::Workers(e.to_string()))?;

    info!(
        "Starting scan of {} with {} workers",
        root.display(),
        options.worker_count()
    );
    let start = Instant::now();

    let max_children = options.max_children;
    let tree = pool.install(|| {
        parallel::scan_tree(&parallel::FsLister, root, progress, max_children)
    });

    info!(
        "Scan complete: {} files, {} dirs, {} bytes in {:?}",
        progress.file_count(),
        progress.dir_count(),
        progress.total_bytes(),
        start.elapsed()
    );
    Ok(tree)
}

/// Handle to a scan running on a background thread.
pub struct ScanHandle {
    progress: Arc<ScanProgress>,
    result_rx: Receiver<Result<FileTree, ScanError>>,
    _thread: Option<thread::JoinHandle<()>>,
}

impl ScanHandle {
    /// Live counters for the running scan.
    pub fn progress(&self) -> &Arc<ScanProgress> {
        &self.progress
    }

    /// Non-blocking poll for the finished tree.
    ///
    /// Returns `None` while the scan is still running. The result is
    /// delivered exactly once.
    pub fn try_result(&self) -> Option<Result<FileTree, ScanError>> {
        match self.result_rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ScanError::Workers(
                "scan thread exited without a result".into(),
            ))),
        }
    }

    /// Block until the scan finishes.
    pub fn wait(self) -> Result<FileTree, ScanError> {
        self.result_rx
            .recv()
            .unwrap_or_else(|_| Err(ScanError::Workers("scan thread exited without a result".into())))
    }
}

/// Start a new scan on a background thread.
///
/// The root is validated on the calling thread, so an invalid path is
/// reported here before anything is spawned.
pub fn start_scan(root: PathBuf, options: ScanOptions) -> Result<ScanHandle, ScanError> {
    validate_root(&root)?;

    let progress = Arc::new(ScanProgress::new());
    let worker_progress = progress.clone();
    let (result_tx, result_rx) = crossbeam_channel::bounded(1);

    let thread = thread::Builder::new()
        .name("sizescope-scanner".into())
        .spawn(move || {
            let result = scan(&root, &worker_progress, &options);
            // The receiver may be gone if the frontend abandoned the scan.
            let _ = result_tx.send(result);
        })
        .map_err(|e| ScanError::Workers(e.to_string()))?;

    Ok(ScanHandle {
        progress,
        result_rx,
        _thread: Some(thread),
    })
}
