/// Live scan counters shared between the scan workers and any number of
/// observers.
///
/// Counters are independent relaxed atomics: a reader may see a byte total
/// that does not yet include the most recent file increment. That is fine
/// for a progress display and nothing in the core reads them for
/// correctness. Values stay at their final totals until the next
/// [`reset`](ScanProgress::reset).
use compact_str::CompactString;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Marker shown in `current_path` between `reset` and the first directory.
pub const INITIALIZING: &str = "Initializing...";

#[derive(Debug)]
pub struct ScanProgress {
    files: AtomicU64,
    dirs: AtomicU64,
    bytes: AtomicU64,
    current: Mutex<CompactString>,
}

/// Point-in-time copy of the counters, for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub files_found: u64,
    pub dirs_found: u64,
    pub total_bytes: u64,
    pub current_path: String,
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanProgress {
    pub fn new() -> Self {
        Self {
            files: AtomicU64::new(0),
            dirs: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            current: Mutex::new(CompactString::new(INITIALIZING)),
        }
    }

    /// Zero the counters and restore the initialising marker.
    pub fn reset(&self) {
        self.files.store(0, Ordering::Relaxed);
        self.dirs.store(0, Ordering::Relaxed);
        self.bytes.store(0, Ordering::Relaxed);
        *self.current.lock() = CompactString::new(INITIALIZING);
    }

    #[inline]
    pub fn record_file(&self, size: u64) {
        self.files.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(size, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dir(&self) {
        self.dirs.fetch_add(1, Ordering::Relaxed);
    }

    /// Publish the name of the directory being visited.
    ///
    /// Never blocks: if an observer or another worker holds the slot the
    /// update is dropped, and the next directory will overwrite it anyway.
    pub fn set_current_path(&self, name: &str) {
        if let Some(mut slot) = self.current.try_lock() {
            slot.clear();
            slot.push_str(name);
        }
    }

    #[inline]
    pub fn file_count(&self) -> u64 {
        self.files.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dir_count(&self) -> u64 {
        self.dirs.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn current_path(&self) -> String {
        self.current.lock().to_string()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            files_found: self.file_count(),
            dirs_found: self.dir_count(),
            total_bytes: self.total_bytes(),
            current_path: self.current_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn reset_restores_initial_state() {
        let progress = ScanProgress::new();
        progress.record_file(10);
        progress.record_dir();
        progress.set_current_path("Documents");
        progress.reset();

        assert_eq!(progress.file_count(), 0);
        assert_eq!(progress.dir_count(), 0);
        assert_eq!(progress.total_bytes(), 0);
        assert_eq!(progress.current_path(), INITIALIZING);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let progress = Arc::new(ScanProgress::new());
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let p = progress.clone();
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        p.record_file(3);
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        assert_eq!(progress.file_count(), 8_000);
        assert_eq!(progress.total_bytes(), 24_000);
    }

    #[test]
    fn snapshot_reflects_counters() {
        let progress = ScanProgress::new();
        progress.record_file(512);
        progress.set_current_path("src");

        let snap = progress.snapshot();
        assert_eq!(snap.files_found, 1);
        assert_eq!(snap.total_bytes, 512);
        assert_eq!(snap.current_path, "src");
    }
}
