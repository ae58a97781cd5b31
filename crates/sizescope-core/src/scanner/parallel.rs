/// Fork/join directory walker.
///
/// Every directory is one task on the rayon pool. While a directory is being
/// listed, each subdirectory is spawned onto the same top-level
/// `rayon::scope` the moment it is discovered, so no task ever blocks on its
/// children and worker stacks never grow with the depth of the tree. A
/// directory is finished by whichever task delivers its last outstanding
/// piece of work (its own listing or a subdirectory); finishing folds it into
/// its parent, walking upward in a loop until a parent still has work in
/// flight or the root is reached.
///
/// # Ownership during the scan
///
/// Each in-flight directory owns the [`Subtree`]s of its finished children
/// behind its own mutex, so no two tasks ever write the same node. Once the
/// root is finished, the owned tree is flattened into the arena in a single
/// pass.
///
/// # Skip-and-continue
///
/// Filesystem errors are absorbed at the smallest scope that contains them:
/// an unreadable entry is dropped, an unlistable directory keeps whatever it
/// accumulated so far (usually nothing), and a directory whose listing
/// panics contributes nothing. None of these abort the parent.
use crate::model::{FileNode, FileTree, NodeIndex, OTHER_FILES_NAME};
use crate::scanner::progress::ScanProgress;
use compact_str::CompactString;
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A scanned directory (or leaf) that is not yet part of any arena.
///
/// `node.size` is final; `node.children` stays empty until flattening.
#[derive(Debug)]
pub(crate) struct Subtree {
    pub(crate) node: FileNode,
    pub(crate) children: Vec<Subtree>,
}

impl Subtree {
    fn leaf(node: FileNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }
}

/// One classified directory entry.
#[derive(Debug, Clone)]
pub(crate) enum Entry {
    File {
        name: CompactString,
        path: PathBuf,
        size: u64,
    },
    Dir(PathBuf),
}

/// Source of directory listings.
pub(crate) trait Lister: Sync {
    /// Emit every readable entry of `dir` as it is read. Failing to open the
    /// directory is the only error; unreadable entries are skipped.
    fn list(&self, dir: &Path, emit: &mut dyn FnMut(Entry)) -> io::Result<()>;
}

/// Lists the real filesystem.
pub(crate) struct FsLister;

impl Lister for FsLister {
    fn list(&self, dir: &Path, emit: &mut dyn FnMut(Entry)) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    skip_entry(dir, &err);
                    continue;
                }
            };
            let path = entry.path();

            // One attribute call per entry. `DirEntry::metadata` does not
            // follow symlinks, so a link is a sized leaf and cycles are impossible.
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(err) => {
                    skip_entry(&path, &err);
                    continue;
                }
            };

            if meta.is_dir() {
                emit(Entry::Dir(path));
            } else {
                emit(Entry::File {
                    name: CompactString::new(entry.file_name().to_string_lossy()),
                    path,
                    size: meta.len(),
                });
            }
        }
        Ok(())
    }
}

/// A directory whose listing or subdirectories are still in flight.
struct PendingDir {
    name: CompactString,
    path: PathBuf,
    /// Owning directory and this directory's discovery sequence in it.
    parent: Option<(Arc<PendingDir>, usize)>,
    state: Mutex<PendingState>,
}

struct PendingState {
    children: Vec<(usize, Subtree)>,
    /// The listing itself plus every subdirectory not yet delivered.
    outstanding: usize,
    /// Set when the listing panicked.
    poisoned: bool,
}

impl PendingDir {
    fn new(path: PathBuf, parent: Option<(Arc<PendingDir>, usize)>) -> Arc<Self> {
        Arc::new(Self {
            name: CompactString::new(display_name(&path)),
            path,
            parent,
            state: Mutex::new(PendingState {
                children: Vec::new(),
                outstanding: 1,
                poisoned: false,
            }),
        })
    }
}

struct Walk<'a, L> {
    lister: &'a L,
    progress: &'a ScanProgress,
    max_children: usize,
    finished: Mutex<Option<Subtree>>,
}

/// Scan `root` and everything below it, returning the finished arena.
///
/// Must be called from inside the worker pool (`ThreadPool::install`) so the
/// spawned directory tasks land on that pool.
pub(crate) fn scan_tree<L: Lister>(
    lister: &L,
    root: PathBuf,
    progress: &ScanProgress,
    max_children: usize,
) -> FileTree {
    let walk = Walk {
        lister,
        progress,
        max_children,
        finished: Mutex::new(None),
    };
    let fallback = FileNode::new_dir(CompactString::new(display_name(&root)), root.clone());
    let top = PendingDir::new(root, None);

    rayon::scope(|s| walk.visit(s, top));

    let subtree = walk
        .finished
        .into_inner()
        .unwrap_or_else(|| Subtree::leaf(fallback));
    flatten(subtree)
}

impl<L: Lister> Walk<'_, L> {
    /// List one directory, spawning a task per subdirectory.
    fn visit<'s>(&'s self, s: &rayon::Scope<'s>, dir: Arc<PendingDir>) {
        self.progress.set_current_path(&dir.name);
        self.progress.record_dir();

        let listed = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut files = Vec::new();
            let mut seq = 0usize;
            let result = self.lister.list(&dir.path, &mut |entry| {
                let discovered = seq;
                seq += 1;
                match entry {
                    Entry::Dir(path) => {
                        dir.state.lock().outstanding += 1;
                        let child = PendingDir::new(path, Some((dir.clone(), discovered)));
                        s.spawn(move |s| self.visit(s, child));
                    }
                    Entry::File { name, path, size } => {
                        self.progress.record_file(size);
                        let file = FileNode::new_file(name, path, size);
                        files.push((discovered, Subtree::leaf(file)));
                    }
                }
            });
            if let Err(err) = result {
                skip_directory(&dir.path, &err);
            }
            files
        }));

        match listed {
            Ok(files) => dir.state.lock().children.extend(files),
            Err(_) => {
                warn!(path = %dir.path.display(), "directory task panicked; subtree dropped");
                dir.state.lock().poisoned = true;
            }
        }
        self.release(dir);
    }

    /// Mark one piece of `dir`'s work as done. Every directory this
    /// completes is finished and handed to its parent.
    fn release(&self, dir: Arc<PendingDir>) {
        let mut current = dir;
        loop {
            let (children, poisoned) = {
                let mut state = current.state.lock();
                state.outstanding -= 1;
                if state.outstanding > 0 {
                    return;
                }
                (std::mem::take(&mut state.children), state.poisoned)
            };
            let finished = (!poisoned).then(|| self.finish(&current, children));

            let Some((parent, seq)) = current.parent.clone() else {
                *self.finished.lock() = finished;
                return;
            };
            if let Some(sub) = finished {
                parent.state.lock().children.push((seq, sub));
            }
            current = parent;
        }
    }

    /// Sort, truncate and size a directory whose children are all in.
    fn finish(&self, dir: &PendingDir, mut children: Vec<(usize, Subtree)>) -> Subtree {
        // Discovery sequence numbers break size ties deterministically.
        children.sort_by(|(seq_a, a), (seq_b, b)| {
            b.node
                .size
                .cmp(&a.node.size)
                .then_with(|| seq_a.cmp(seq_b))
        });
        let mut children: Vec<Subtree> = children.into_iter().map(|(_, sub)| sub).collect();
        truncate_children(&mut children, &dir.path, self.max_children);

        let mut node = FileNode::new_dir(dir.name.clone(), dir.path.clone());
        node.size = children.iter().map(|c| c.node.size).sum();
        Subtree { node, children }
    }
}

/// Cap a size-sorted child list at `max_children`, folding the remainder
/// into one synthetic aggregate when it is non-empty by size.
///
/// The aggregate is placed by size like any other child so the list stays
/// sorted. The folded entries are discarded.
pub(crate) fn truncate_children(children: &mut Vec<Subtree>, owner: &Path, max_children: usize) {
    if children.len() <= max_children {
        return;
    }

    let overflow: u64 = children.drain(max_children..).map(|c| c.node.size).sum();
    if overflow == 0 {
        return;
    }

    let other = FileNode::new_synthetic(
        CompactString::new(OTHER_FILES_NAME),
        owner.to_path_buf(),
        overflow,
    );
    let at = children.partition_point(|c| c.node.size >= overflow);
    children.insert(at, Subtree::leaf(other));
}

/// Move an owned subtree into a fresh arena, parents before children.
pub(crate) fn flatten(root: Subtree) -> FileTree {
    let mut tree = FileTree::with_capacity(1 + root.children.len());
    let root_idx = tree.add_root(root.node);

    let mut pending: Vec<(NodeIndex, Vec<Subtree>)> = vec![(root_idx, root.children)];
    while let Some((parent, children)) = pending.pop() {
        for child in children {
            let idx = tree.add_node(child.node);
            tree.add_child(parent, idx);
            if !child.children.is_empty() {
                pending.push((idx, child.children));
            }
        }
    }
    tree
}

/// Display name for a directory: its final segment, or the whole path when
/// there is none (filesystem or drive roots).
pub(crate) fn display_name(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.to_string_lossy().into_owned(),
    }
}

fn skip_entry(path: &Path, err: &io::Error) {
    trace!(path = %path.display(), error = %err, "skipping unreadable entry");
}

fn skip_directory(path: &Path, err: &io::Error) {
    debug!(path = %path.display(), error = %err, "skipping unlistable directory");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn leaf(name: &str, size: u64) -> Subtree {
        Subtree::leaf(FileNode::new_file(
            CompactString::new(name),
            PathBuf::from("/d").join(name),
            size,
        ))
    }

    /// In-memory directory listings. Paths without a listing fail to open;
    /// `panic_in` panics after its entries have been emitted.
    #[derive(Default)]
    struct FakeFs {
        dirs: HashMap<PathBuf, Vec<Entry>>,
        panic_in: Option<PathBuf>,
    }

    impl FakeFs {
        fn dir(&mut self, path: &str, entries: Vec<Entry>) -> &mut Self {
            self.dirs.insert(PathBuf::from(path), entries);
            self
        }
    }

    impl Lister for FakeFs {
        fn list(&self, dir: &Path, emit: &mut dyn FnMut(Entry)) -> io::Result<()> {
            let entries = self.dirs.get(dir).ok_or_else(|| {
                io::Error::new(io::ErrorKind::PermissionDenied, "access denied")
            })?;
            for entry in entries {
                emit(entry.clone());
            }
            if self.panic_in.as_deref() == Some(dir) {
                panic!("listing {} blew up", dir.display());
            }
            Ok(())
        }
    }

    fn file(path: &str, size: u64) -> Entry {
        let path = PathBuf::from(path);
        Entry::File {
            name: CompactString::new(display_name(&path)),
            path,
            size,
        }
    }

    fn subdir(path: &str) -> Entry {
        Entry::Dir(PathBuf::from(path))
    }

    fn child_named(tree: &FileTree, parent: NodeIndex, name: &str) -> Option<NodeIndex> {
        tree.children(parent)
            .iter()
            .copied()
            .find(|&c| tree.node(c).name == name)
    }

    #[test]
    fn truncation_keeps_top_children_and_folds_rest() {
        let mut children: Vec<Subtree> = (1..=8u64).rev().map(|s| leaf(&s.to_string(), s)).collect();
        truncate_children(&mut children, Path::new("/d"), 5);

        // 8,7,6,5,4 kept; 3+2+1 = 6 folded and placed after the kept 6.
        let sizes: Vec<u64> = children.iter().map(|c| c.node.size).collect();
        assert_eq!(sizes, vec![8, 7, 6, 6, 5, 4]);
        let other = &children[3].node;
        assert!(other.is_synthetic);
        assert_eq!(other.name, OTHER_FILES_NAME);
        assert_eq!(other.path, PathBuf::from("/d"));
    }

    #[test]
    fn no_aggregate_at_or_below_limit() {
        let mut children: Vec<Subtree> = (1..=5u64).rev().map(|s| leaf(&s.to_string(), s)).collect();
        truncate_children(&mut children, Path::new("/d"), 5);
        assert_eq!(children.len(), 5);
        assert!(children.iter().all(|c| !c.node.is_synthetic));
    }

    #[test]
    fn zero_size_overflow_produces_no_aggregate() {
        let mut children = vec![leaf("a", 10), leaf("b", 0), leaf("c", 0)];
        truncate_children(&mut children, Path::new("/d"), 1);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].node.name, "a");
    }

    #[test]
    fn flatten_links_parents_and_preserves_order() {
        let mut dir = FileNode::new_dir(CompactString::new("d"), PathBuf::from("/d"));
        dir.size = 30;
        let root = Subtree {
            node: dir,
            children: vec![leaf("x", 20), leaf("y", 10)],
        };

        let tree = flatten(root);
        let root = tree.root().unwrap();
        let names: Vec<&str> = tree
            .children(root)
            .iter()
            .map(|&c| tree.node(c).name.as_str())
            .collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(tree.node(root).size, 30);
        assert!(tree
            .children(root)
            .iter()
            .all(|&c| tree.node(c).parent == Some(root)));
    }

    #[test]
    fn display_name_falls_back_to_full_path() {
        assert_eq!(display_name(Path::new("/var/log")), "log");
        assert_eq!(display_name(Path::new("/")), "/");
    }

    #[test]
    fn unlistable_directory_becomes_empty_node() {
        let mut fs = FakeFs::default();
        fs.dir(
            "/r",
            vec![file("/r/a.txt", 10), subdir("/r/locked"), subdir("/r/open")],
        )
        .dir("/r/open", vec![file("/r/open/b.txt", 5)]);

        let progress = ScanProgress::new();
        let tree = scan_tree(&fs, PathBuf::from("/r"), &progress, 50);
        let root = tree.root().unwrap();

        let locked = child_named(&tree, root, "locked").expect("locked dir kept");
        assert!(tree.node(locked).is_dir);
        assert_eq!(tree.node(locked).size, 0);
        assert!(tree.children(locked).is_empty());

        let open = child_named(&tree, root, "open").unwrap();
        assert_eq!(tree.node(open).size, 5);
        assert_eq!(tree.node(root).size, 15);
        assert_eq!(progress.dir_count(), 3);
    }

    #[test]
    fn unlistable_root_is_an_empty_tree() {
        let tree = scan_tree(&FakeFs::default(), PathBuf::from("/gone"), &ScanProgress::new(), 50);
        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).size, 0);
        assert!(tree.children(root).is_empty());
    }

    /// `/r/bad` panics after announcing a subdirectory and a file: neither
    /// may reach the result, while the siblings are scanned completely.
    #[test]
    fn panicking_directory_contributes_nothing() {
        let mut fs = FakeFs {
            panic_in: Some(PathBuf::from("/r/bad")),
            ..FakeFs::default()
        };
        fs.dir(
            "/r",
            vec![subdir("/r/bad"), subdir("/r/good"), file("/r/x.bin", 7)],
        )
        .dir("/r/bad", vec![subdir("/r/bad/inner"), file("/r/bad/y.bin", 100)])
        .dir("/r/bad/inner", vec![file("/r/bad/inner/z.bin", 50)])
        .dir("/r/good", vec![file("/r/good/g.bin", 3)]);

        let tree = scan_tree(&fs, PathBuf::from("/r"), &ScanProgress::new(), 50);
        let root = tree.root().unwrap();

        let names: Vec<&str> = tree
            .children(root)
            .iter()
            .map(|&c| tree.node(c).name.as_str())
            .collect();
        assert_eq!(names, vec!["x.bin", "good"]);
        assert_eq!(tree.node(root).size, 10);
    }

    #[test]
    fn panicking_root_yields_empty_root() {
        let mut fs = FakeFs {
            panic_in: Some(PathBuf::from("/r")),
            ..FakeFs::default()
        };
        fs.dir("/r", vec![file("/r/a", 1)]);

        let tree = scan_tree(&fs, PathBuf::from("/r"), &ScanProgress::new(), 50);
        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).size, 0);
        assert_eq!(tree.node(root).name, "r");
        assert!(tree.children(root).is_empty());
    }

    /// Far deeper than any worker stack could hold if each level nested
    /// its own scope.
    #[test]
    fn very_deep_chain_scans_without_recursion() {
        const DEPTH: usize = 3_000;

        let mut fs = FakeFs::default();
        let mut path = PathBuf::from("/r");
        for _ in 0..DEPTH {
            let next = path.join("a");
            fs.dirs.insert(path.clone(), vec![Entry::Dir(next.clone())]);
            path = next;
        }
        let bottom = path.join("leaf.bin");
        fs.dirs.insert(
            path,
            vec![Entry::File {
                name: CompactString::new("leaf.bin"),
                path: bottom,
                size: 3,
            }],
        );

        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let progress = ScanProgress::new();
        let tree = pool.install(|| scan_tree(&fs, PathBuf::from("/r"), &progress, 50));

        assert_eq!(tree.reachable_len(), DEPTH + 2);
        assert_eq!(tree.node(tree.root().unwrap()).size, 3);
        assert_eq!(progress.dir_count(), DEPTH as u64 + 1);
    }
}
