//! Repo map: a filtered file listing of the working tree (spec.md §4.2
//! `get_repo_map`), excluding `.git/` and anything `.gitignore` hides.
//!
//! Uses the `ignore` crate's walker, the same crate the broader Rust
//! ecosystem reaches for to implement gitignore-aware directory walks
//! (e.g. ripgrep).

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use serde::Serialize;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Serialize)]
pub struct RepoMapEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Walk `root`, honoring `.gitignore`/`.ignore`, skipping `.git/`.
pub fn walk_repo_map(root: &Path) -> Result<Vec<RepoMapEntry>> {
    let mut entries = Vec::new();
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    for result in walker {
        let entry = result.map_err(|e| EngineError::StoreError {
            path: root.to_path_buf(),
            cause: e.to_string(),
        })?;
        if entry.path() == root {
            continue;
        }
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        entries.push(RepoMapEntry {
            path: rel.to_path_buf(),
            is_dir,
        });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}
