/// Command-line arguments.
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    /// Directory tree, largest entries first.
    Tree,
    /// Totals per file-type category.
    Categories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// Scan a directory and show where the space went.
#[derive(Debug, Parser)]
#[command(name = "sizescope", version, about)]
pub struct Args {
    /// Directory to scan.
    pub path: PathBuf,

    /// JSON config file with scan settings and category rules.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Worker threads (defaults to the number of logical CPUs).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Children kept per directory before the rest is folded into one entry.
    #[arg(long)]
    pub max_children: Option<usize>,

    /// Tree levels to print below the root.
    #[arg(long, default_value_t = 1)]
    pub depth: usize,

    #[arg(long, value_enum, default_value_t = View::Tree)]
    pub view: View,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print filesystem details for one scanned path instead of a report.
    #[arg(long, value_name = "PATH", conflicts_with = "delete")]
    pub details: Option<PathBuf>,

    /// Delete one scanned path from disk, then print the updated report.
    #[arg(long, value_name = "PATH")]
    pub delete: Option<PathBuf>,

    /// Delete without asking for confirmation.
    #[arg(long, requires = "delete")]
    pub yes: bool,

    /// Log debug output (including skipped directories) to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}
