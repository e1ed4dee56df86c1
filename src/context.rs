//! Gathers request context from the filesystem for the command-line client.

use crate::models::{ChatHistoryEntry, RelatedFile};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const DEFAULT_GOAL: &str = "Analyze code for issues and suggest improvements";
const DEFAULT_RELEVANCE: &str = "related file";
const SKIPPED_DIRS: &[&str] = &["target", ".git", "node_modules"];

/// Guesses a language tag from a file extension.
pub fn detect_language(path: &Path) -> Option<&'static str> {
    let language = match path.extension()?.to_str()? {
        "rs" => "rust",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "jsx",
        "ts" | "mts" | "cts" => "typescript",
        "tsx" => "tsx",
        "py" => "python",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "rb" => "ruby",
        "php" => "php",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" => "cpp",
        "cs" => "csharp",
        "swift" => "swift",
        "sh" | "bash" => "bash",
        "sql" => "sql",
        _ => return None,
    };
    Some(language)
}

/// Parses a `path[=relevance]` argument and reads the file.
pub fn read_related_file(arg: &str) -> Result<RelatedFile> {
    let (path, relevance) = match arg.split_once('=') {
        Some((path, relevance)) if !relevance.trim().is_empty() => (path, relevance.trim()),
        Some((path, _)) => (path, DEFAULT_RELEVANCE),
        None => (arg, DEFAULT_RELEVANCE),
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read related file {}", path))?;
    Ok(RelatedFile {
        path: path.to_string(),
        content,
        relevance: relevance.to_string(),
    })
}

/// Collects every readable file under `dir` whose language matches
/// `language`, skipping build and VCS directories and `exclude`.
pub fn collect_related_dir(dir: &Path, language: &str, exclude: Option<&Path>) -> Vec<RelatedFile> {
    let exclude = exclude.and_then(|p| p.canonicalize().ok());
    WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| {
            let skip = e.depth() > 0
                && e.file_type().is_dir()
                && e.file_name().to_str().is_some_and(|name| SKIPPED_DIRS.contains(&name));
            if skip {
                debug!("Skipping directory: {}", e.path().display());
            }
            !skip
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| detect_language(e.path()) == Some(language))
        .filter(|e| exclude.is_none() || e.path().canonicalize().ok() != exclude)
        .filter_map(|e| {
            let path = e.path();
            match fs::read_to_string(path) {
                Ok(content) => Some(RelatedFile {
                    path: path
                        .strip_prefix(dir)
                        .unwrap_or(path)
                        .to_string_lossy()
                        .to_string(),
                    content,
                    relevance: format!("same directory as {}", dir.display()),
                }),
                Err(e) => {
                    warn!("Unable to read file: {} - {}", path.display(), e);
                    None
                }
            }
        })
        .collect()
}

pub fn history_entries(messages: &[String]) -> Vec<ChatHistoryEntry> {
    messages
        .iter()
        .map(|message| ChatHistoryEntry {
            message: message.clone(),
            timestamp: None,
        })
        .collect()
}
