//! Directory-wide complexity scan.
//!
//! Files are selected by extension, read, and estimated in parallel. A file
//! that cannot be read is reported in the log and left out.

use phf::phf_map;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::analysis::{self, SpaceComplexity, TimeComplexity};

/// Extension to language label for scanned files.
static EXTENSION_LANGUAGES: phf::Map<&'static str, &'static str> = phf_map! {
    "py" => "python",
    "js" => "javascript",
    "jsx" => "javascript",
    "mjs" => "javascript",
    "cjs" => "javascript",
    "ts" => "typescript",
    "tsx" => "typescript",
    "java" => "java",
    "cs" => "csharp",
    "cpp" => "cpp",
    "cc" => "cpp",
    "cxx" => "cpp",
    "hpp" => "cpp",
    "c" => "c",
    "h" => "c",
    "go" => "go",
    "rb" => "ruby",
    "php" => "php",
    "rs" => "rust",
    "kt" => "kotlin",
    "kts" => "kotlin",
    "swift" => "swift",
    "sql" => "sql",
    "sh" => "bash",
    "bash" => "bash",
};

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["vendor", "node_modules", "target", "__pycache__"];

/// Language label for `path`, from its extension.
pub fn language_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    EXTENSION_LANGUAGES.get(ext.as_str()).copied()
}

/// Complexity estimate for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub file: String,
    pub language: String,
    pub time: TimeComplexity,
    pub space: SpaceComplexity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Collect recognised source files under `root`, sorted by path.
pub fn collect_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).into_iter().filter_entry(|e| {
        if e.depth() == 0 || !e.file_type().is_dir() {
            return true;
        }
        let name = e.file_name().to_string_lossy();
        !name.starts_with('.') && !SKIPPED_DIRS.iter().any(|d| *d == name)
    }) {
        let entry = entry?;
        if entry.file_type().is_file() && language_for_path(entry.path()).is_some() {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Path shown in reports: relative to `root` when possible.
fn display_path(path: &Path, root: &Path) -> String {
    if path == root {
        return path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
    }
    path.strip_prefix(root)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| path.display().to_string())
}

/// Estimate every file in parallel. Output keeps the input order.
pub fn scan_files(files: &[PathBuf], root: &Path) -> Vec<ScanEntry> {
    files
        .par_iter()
        .filter_map(|path| {
            let language = language_for_path(path)?;
            let source = match std::fs::read(path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    return None;
                }
            };
            let result = analysis::estimate(&source, language);
            Some(ScanEntry {
                file: display_path(path, root),
                language: language.to_string(),
                time: result.time,
                space: result.space,
                notes: result.notes,
            })
        })
        .collect()
}

/// Entries whose time label exceeds `max`.
pub fn over_limit(entries: &[ScanEntry], max: TimeComplexity) -> Vec<&ScanEntry> {
    entries.iter().filter(|e| e.time > max).collect()
}
