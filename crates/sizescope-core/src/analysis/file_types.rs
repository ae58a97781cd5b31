/// File type categorisation based on file extensions.
///
/// Buckets every real file below a node by extension, independent of the
/// directory structure. User rules are consulted first, then the built-in
/// [`FileCategory`] table, and anything unmatched (or extension-less) lands
/// in `Other`. The `[Other Files]` truncation aggregate is skipped because
/// the types of the files folded into it are unknown.
use crate::model::{FileNode, FileTree, NodeIndex};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Broad built-in file type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Documents,
    Images,
    Video,
    Audio,
    Archives,
    Code,
    Executables,
    System,
    Other,
}

impl FileCategory {
    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Documents => "Documents",
            Self::Images => "Images",
            Self::Video => "Video",
            Self::Audio => "Audio",
            Self::Archives => "Archives",
            Self::Code => "Code",
            Self::Executables => "Executables",
            Self::System => "System",
            Self::Other => "Other",
        }
    }
}

/// Categorise an already-lowercased extension with the built-in table.
pub fn categorise_extension(ext: &str) -> FileCategory {
    match ext {
        "doc" | "docx" | "pdf" | "txt" | "rtf" | "odt" | "xls" | "xlsx" | "ppt" | "pptx"
        | "csv" | "md" | "epub" => FileCategory::Documents,
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" | "webp" | "ico" | "tiff" | "tif"
        | "psd" | "raw" | "cr2" | "nef" | "heic" | "heif" => FileCategory::Images,
        "mp4" | "mkv" | "avi" | "mov" | "wmv" | "flv" | "webm" | "m4v" | "mpg" | "mpeg" | "3gp" => {
            FileCategory::Video
        }
        "mp3" | "wav" | "flac" | "aac" | "ogg" | "wma" | "m4a" | "opus" | "aiff" | "mid" => {
            FileCategory::Audio
        }
        "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" | "xz" | "zst" | "cab" | "iso" | "jar"
        | "war" => FileCategory::Archives,
        "rs" | "py" | "js" | "ts" | "jsx" | "tsx" | "c" | "cpp" | "h" | "hpp" | "cs" | "java"
        | "go" | "rb" | "php" | "swift" | "kt" | "scala" | "html" | "css" | "scss" | "json"
        | "xml" | "yaml" | "yml" | "toml" | "sql" | "sh" | "bat" | "ps1" => FileCategory::Code,
        "exe" | "msi" | "dll" | "so" | "dylib" | "app" | "dmg" | "apk" | "com" | "scr" => {
            FileCategory::Executables
        }
        "sys" | "drv" | "inf" | "ini" | "cfg" | "log" | "etl" | "dat" | "reg" | "tmp" | "bak" => {
            FileCategory::System
        }
        _ => FileCategory::Other,
    }
}

/// Lowercased text after the last `.` of a file name, if any.
pub fn extension_of(name: &str) -> Option<String> {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext.to_ascii_lowercase()),
        _ => None,
    }
}

/// One user-defined category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub extensions: Vec<String>,
}

/// User-configurable extension → category mapping.
///
/// Rules are checked in order; the first rule listing an extension wins.
/// Extensions are stored lowercased without a leading dot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CategoryRule>", into = "Vec<CategoryRule>")]
pub struct CategoryRules {
    rules: Vec<CategoryRule>,
}

impl From<Vec<CategoryRule>> for CategoryRules {
    fn from(rules: Vec<CategoryRule>) -> Self {
        let mut out = Self::default();
        for rule in rules {
            out.insert(rule.name, rule.extensions);
        }
        out
    }
}

impl From<CategoryRules> for Vec<CategoryRule> {
    fn from(rules: CategoryRules) -> Self {
        rules.rules
    }
}

impl CategoryRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the category `name`.
    pub fn insert<I, S>(&mut self, name: impl Into<String>, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into();
        let extensions: Vec<String> = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        match self.rules.iter_mut().find(|r| r.name == name) {
            Some(existing) => existing.extensions = extensions,
            None => self.rules.push(CategoryRule { name, extensions }),
        }
    }

    /// Remove the category `name`, returning `true` if it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.name != name);
        self.rules.len() != before
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve the category label for a file name.
    pub fn classify(&self, file_name: &str) -> &str {
        let Some(ext) = extension_of(file_name) else {
            return FileCategory::Other.label();
        };
        self.rules
            .iter()
            .find(|r| r.extensions.iter().any(|e| *e == ext))
            .map(|r| r.name.as_str())
            .unwrap_or_else(|| categorise_extension(&ext).label())
    }
}

/// Size and count totals for a single category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryStats {
    pub name: CompactString,
    pub total_size: u64,
    pub file_count: u64,
}

impl CategoryStats {
    /// Synthetic, childless node for this bucket, reusing `owner_path`.
    pub fn to_node(&self, owner_path: &std::path::Path) -> FileNode {
        FileNode::new_synthetic(self.name.clone(), owner_path.to_path_buf(), self.total_size)
    }
}

/// Per-category totals for every real file at or below `index`, largest
/// category first (ties by name).
pub fn categorize(tree: &FileTree, index: NodeIndex, rules: &CategoryRules) -> Vec<CategoryStats> {
    let mut map: HashMap<&str, (u64, u64)> = HashMap::new();

    let mut stack = vec![index];
    while let Some(idx) = stack.pop() {
        let node = tree.node(idx);
        if node.is_synthetic {
            continue;
        }
        if node.is_dir {
            stack.extend_from_slice(tree.children(idx));
            continue;
        }
        let entry = map.entry(rules.classify(&node.name)).or_default();
        entry.0 += node.size;
        entry.1 += 1;
    }

    let mut results: Vec<CategoryStats> = map
        .into_iter()
        .map(|(name, (total_size, file_count))| CategoryStats {
            name: CompactString::new(name),
            total_size,
            file_count,
        })
        .collect();
    results.sort_by(|a, b| b.total_size.cmp(&a.total_size).then_with(|| a.name.cmp(&b.name)));
    results
}

/// [`categorize`], materialised as synthetic nodes for a list/pie view.
pub fn category_nodes(tree: &FileTree, index: NodeIndex, rules: &CategoryRules) -> Vec<FileNode> {
    let owner = tree.path(index);
    categorize(tree, index, rules)
        .iter()
        .map(|stats| stats.to_node(owner))
        .collect()
}
