//! Rollback handler (spec.md §4.7): inverts the promoted commit and opens a
//! fix workpad, keeping trunk append-only and never silently re-trying.

use serde::Serialize;

use crate::error::Result;
use crate::git::GitRepo;
use crate::store::{Checkpoint, Store, WorkpadRecord, WorkpadStatus, TestStatus as WorkpadTestStatus};

#[derive(Debug, Clone, Serialize)]
pub struct RollbackRecord {
    pub reverted_commit: String,
    pub new_pad_id: String,
    pub cause: String,
}

/// Revert `promoted_commit` on trunk and open `fix-ci-<short-hash>`,
/// parented at the new trunk tip (spec.md §4.7 "Rollback handler").
pub fn rollback(store: &Store, repo: &GitRepo, repo_id: &str, trunk: &str, promoted_commit: &str, cause: String) -> Result<RollbackRecord> {
    repo.checkout(trunk)?;
    let reverted_commit = repo.revert_commit(promoted_commit)?;

    let short = &promoted_commit[..promoted_commit.len().min(8)];
    let pad_id = crate::store::next_pad_id(repo_id, &format!("fix-ci-{short}"));
    let branch = format!("workpad/{pad_id}");
    repo.create_branch_at(&branch, &reverted_commit)?;

    let now = chrono::Utc::now();
    let record = WorkpadRecord {
        id: pad_id.clone(),
        repo_id: repo_id.to_string(),
        title: format!("fix-ci-{short}"),
        branch,
        status: WorkpadStatus::Active,
        test_status: WorkpadTestStatus::Unknown,
        created_at: now,
        last_activity_at: now,
        checkpoints: Vec::new(),
    };
    store.create_workpad(pad_id.clone(), record)?;
    store.add_checkpoint(Checkpoint {
        commit_hash: reverted_commit.clone(),
        message: format!("revert: {cause}"),
        author: "sologit <sologit@localhost>".to_string(),
        timestamp: now,
        files: Vec::new(),
        parent: Some(promoted_commit.to_string()),
    })?;

    Ok(RollbackRecord {
        reverted_commit,
        new_pad_id: pad_id,
        cause,
    })
}
