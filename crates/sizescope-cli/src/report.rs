/// Report rows and renderers for the tree, category and details views.
use crate::args::OutputFormat;
use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Serialize;
use sizescope_core::analysis::{CategoryStats, NodeDetails};
use sizescope_core::model::{format_count, format_size, FileTree, NodeIndex};
use std::io::Write;

/// One line of the tree view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeRow {
    pub depth: usize,
    pub name: String,
    pub path: String,
    pub kind: &'static str,
    pub size: u64,
    pub human_size: String,
    pub share: f32,
}

/// One line of the category view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRow {
    pub category: String,
    pub size: u64,
    pub human_size: String,
    pub files: u64,
}

/// Filesystem details for one node, flattened for every output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailsRow {
    pub path: String,
    pub kind: &'static str,
    pub size: u64,
    pub human_size: String,
    pub size_on_disk: u64,
    pub created: String,
    pub modified: String,
    pub accessed: String,
    pub readonly: bool,
    pub hidden: bool,
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl From<&NodeDetails> for DetailsRow {
    fn from(d: &NodeDetails) -> Self {
        let kind = if d.is_symlink {
            "symlink"
        } else if d.is_dir {
            "dir"
        } else {
            "file"
        };
        Self {
            path: d.path.display().to_string(),
            kind,
            size: d.tree_size,
            human_size: format_size(d.tree_size),
            size_on_disk: d.size_on_disk,
            created: timestamp(d.created),
            modified: timestamp(d.modified),
            accessed: timestamp(d.accessed),
            readonly: d.readonly,
            hidden: d.hidden,
            read: d.permissions.read,
            write: d.permissions.write,
            execute: d.permissions.execute,
        }
    }
}

fn timestamp(time: Option<DateTime<Local>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Flatten the tree into rows, root first, down to `max_depth` levels.
pub fn tree_rows(tree: &FileTree, max_depth: usize) -> Vec<TreeRow> {
    let Some(root) = tree.root() else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    let mut stack: Vec<(NodeIndex, usize)> = vec![(root, 0)];
    while let Some((idx, depth)) = stack.pop() {
        let node = tree.node(idx);
        let kind = if node.is_synthetic {
            "other"
        } else if node.is_dir {
            "dir"
        } else {
            "file"
        };
        rows.push(TreeRow {
            depth,
            name: node.name.to_string(),
            path: node.path.display().to_string(),
            kind,
            size: node.size,
            human_size: format_size(node.size),
            share: tree.share_of_parent(idx),
        });
        if depth < max_depth {
            stack.extend(tree.children(idx).iter().rev().map(|&c| (c, depth + 1)));
        }
    }
    rows
}

pub fn category_rows(stats: &[CategoryStats]) -> Vec<CategoryRow> {
    stats
        .iter()
        .map(|s| CategoryRow {
            category: s.name.to_string(),
            size: s.total_size,
            human_size: format_size(s.total_size),
            files: s.file_count,
        })
        .collect()
}

pub fn write_tree<W: Write>(out: &mut W, rows: &[TreeRow], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for row in rows {
                let indent = "  ".repeat(row.depth);
                let marker = if row.kind == "dir" { "/" } else { "" };
                writeln!(
                    out,
                    "{:>10}  {:>5.1}%  {indent}{}{marker}",
                    row.human_size, row.share, row.name
                )?;
            }
            Ok(())
        }
        OutputFormat::Json => write_json(out, rows),
        OutputFormat::Csv => write_csv(out, rows),
    }
}

pub fn write_categories<W: Write>(
    out: &mut W,
    rows: &[CategoryRow],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for row in rows {
                writeln!(
                    out,
                    "{:>10}  {:>9} files  {}",
                    row.human_size,
                    format_count(row.files),
                    row.category
                )?;
            }
            Ok(())
        }
        OutputFormat::Json => write_json(out, rows),
        OutputFormat::Csv => write_csv(out, rows),
    }
}

pub fn write_details<W: Write>(out: &mut W, row: &DetailsRow, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let or_unknown = |s: &str| if s.is_empty() { "unknown".to_owned() } else { s.to_owned() };
            let flag = |b: bool| if b { "yes" } else { "no" };
            writeln!(out, "path:      {}", row.path)?;
            writeln!(out, "kind:      {}", row.kind)?;
            writeln!(out, "size:      {} ({} bytes)", row.human_size, row.size)?;
            writeln!(out, "created:   {}", or_unknown(&row.created))?;
            writeln!(out, "modified:  {}", or_unknown(&row.modified))?;
            writeln!(out, "accessed:  {}", or_unknown(&row.accessed))?;
            writeln!(out, "hidden:    {}", flag(row.hidden))?;
            writeln!(
                out,
                "access:    read {}  write {}  execute {}",
                flag(row.read),
                flag(row.write),
                flag(row.execute)
            )?;
            Ok(())
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, row)?;
            writeln!(out)?;
            Ok(())
        }
        OutputFormat::Csv => write_csv(out, std::slice::from_ref(row)),
    }
}

fn write_json<W: Write, R: Serialize>(out: &mut W, rows: &[R]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, rows)?;
    writeln!(out)?;
    Ok(())
}

fn write_csv<W: Write, R: Serialize>(out: &mut W, rows: &[R]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
