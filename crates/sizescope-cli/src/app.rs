/// Drives one scan from parsed arguments to rendered output.
use crate::args::{Args, View};
use crate::report;
use anyhow::{Context, Result};
use parking_lot::RwLock;
use sizescope_core::analysis::{categorize, node_details};
use sizescope_core::config::Config;
use sizescope_core::{
    delete, format_size, start_scan, Deletion, FileTree, NodeIndex, ScanProgress, SharedTree,
};
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    let handle = start_scan(args.path.clone(), config.scan.clone())
        .with_context(|| format!("cannot scan {}", args.path.display()))?;

    let show_progress = io::stderr().is_terminal();
    let tree = loop {
        if let Some(result) = handle.try_result() {
            break result.context("scan failed")?;
        }
        if show_progress {
            print_progress(handle.progress());
        }
        std::thread::sleep(POLL_INTERVAL);
    };
    if show_progress {
        eprint!("\r\x1b[2K");
    }

    info!(
        "{} reachable nodes, {} total",
        tree.reachable_len(),
        tree.root()
            .map(|r| format_size(tree.node(r).size))
            .unwrap_or_default()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(target) = &args.details {
        let index = locate(&tree, target)?;
        let details = node_details(&tree, index)?;
        report::write_details(&mut out, &report::DetailsRow::from(&details), args.format)?;
        out.flush()?;
        return Ok(());
    }

    let tree: SharedTree = Arc::new(RwLock::new(tree));
    if let Some(target) = &args.delete {
        let outcome = if args.yes {
            delete_path(&tree, target, |_, _| Ok(true))?
        } else {
            delete_path(&tree, target, ask_on_terminal)?
        };
        match outcome {
            Some(Deletion::RootRemoved { freed }) => {
                eprintln!("Deleted scan root {}, freed {}", target.display(), format_size(freed));
                return Ok(());
            }
            Some(Deletion::Detached { freed }) => {
                eprintln!("Deleted {}, freed {}", target.display(), format_size(freed));
            }
            None => eprintln!("Nothing deleted"),
        }
    }

    render(&mut out, &tree.read(), &args, &config)?;
    out.flush()?;
    Ok(())
}

/// Resolve a user-supplied path to its node in the scanned tree.
fn locate(tree: &FileTree, target: &Path) -> Result<NodeIndex> {
    let absolute = std::path::absolute(target)
        .with_context(|| format!("cannot resolve {}", target.display()))?;
    tree.find(&absolute)
        .with_context(|| format!("{} is not an entry of the scanned tree", target.display()))
}

/// Delete `target` once `confirm` agrees. `Ok(None)` means the user declined.
fn delete_path<F>(tree: &SharedTree, target: &Path, confirm: F) -> Result<Option<Deletion>>
where
    F: FnOnce(&Path, u64) -> Result<bool>,
{
    let (index, size) = {
        let tree = tree.read();
        let index = locate(&tree, target)?;
        (index, tree.node(index).size)
    };
    if !confirm(target, size)? {
        info!("Deletion of {} declined", target.display());
        return Ok(None);
    }
    let outcome = delete(tree, index).with_context(|| format!("deleting {}", target.display()))?;
    Ok(Some(outcome))
}

fn ask_on_terminal(target: &Path, size: u64) -> Result<bool> {
    eprint!("Delete {} ({})? [y/N] ", target.display(), format_size(size));
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Config file first, then command-line overrides on top.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            Config::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(threads) = args.threads {
        config.scan.threads = Some(threads);
    }
    if let Some(max) = args.max_children {
        config.scan.max_children = max;
    }
    Ok(config)
}

fn render<W: Write>(out: &mut W, tree: &FileTree, args: &Args, config: &Config) -> Result<()> {
    match args.view {
        View::Tree => {
            let rows = report::tree_rows(tree, args.depth);
            report::write_tree(out, &rows, args.format)
        }
        View::Categories => {
            let stats = match tree.root() {
                Some(root) => categorize(tree, root, &config.categories),
                None => Vec::new(),
            };
            report::write_categories(out, &report::category_rows(&stats), args.format)
        }
    }
}

fn print_progress(progress: &ScanProgress) {
    let snap = progress.snapshot();
    let mut path = snap.current_path;
    let len = path.chars().count();
    if len > 60 {
        let tail: String = path.chars().skip(len - 57).collect();
        path = format!("...{tail}");
    }
    eprint!(
        "\r\x1b[2K{} files, {} dirs, {}  {}",
        snap.files_found,
        snap.dirs_found,
        format_size(snap.total_bytes),
        path
    );
    let _ = io::stderr().flush();
}
