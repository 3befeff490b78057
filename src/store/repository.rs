//! `Repository` metadata record (spec.md §3 "Repository").

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted metadata for one repository. The git working tree itself lives
/// under `path`; this record never duplicates anything the working tree
/// already knows (spec.md §3 "Ownership").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoRecord {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub trunk: String,
    pub created_at: DateTime<Utc>,
    pub origin_url: Option<String>,
}

/// Fields a caller supplies when creating a repository; `id`, `path`, and
/// `created_at` are filled in by the git engine / store.
#[derive(Debug, Clone)]
pub struct NewRepo {
    pub name: String,
    pub path: PathBuf,
    pub trunk: String,
    pub origin_url: Option<String>,
}
