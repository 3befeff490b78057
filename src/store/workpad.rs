//! `Workpad` and `Checkpoint` metadata records (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a workpad. Once a workpad leaves `Active` it is
/// immutable (spec.md §3 invariant 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkpadStatus {
    Active,
    Promoted,
    Deleted,
}

/// Last-known test outcome for a workpad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Unknown,
    Green,
    Red,
}

/// One applied patch, recorded 1:1 with the commit it produced (spec.md §9,
/// Open Question 1 — checkpoints are treated as equal to commits).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub commit_hash: String,
    pub message: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub files: Vec<String>,
    pub parent: Option<String>,
}

/// Persisted metadata for one workpad.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkpadRecord {
    pub id: String,
    pub repo_id: String,
    pub title: String,
    pub branch: String,
    pub status: WorkpadStatus,
    pub test_status: TestStatus,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub checkpoints: Vec<String>,
}

impl WorkpadRecord {
    pub fn is_active(&self) -> bool {
        self.status == WorkpadStatus::Active
    }
}

/// Filter/sort parameters for `list_workpads_filtered` (spec.md §4.2).
#[derive(Debug, Clone, Default)]
pub struct WorkpadFilter {
    pub repo_id: Option<String>,
    pub status: Option<WorkpadStatus>,
    pub test_status: Option<TestStatus>,
    pub sort_by: Option<WorkpadSortKey>,
    pub reverse: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkpadSortKey {
    CreatedAt,
    LastActivityAt,
    Title,
}
