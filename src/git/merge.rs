//! Fast-forward promotion discipline (spec.md §4.2): `can_promote`,
//! `get_workpad_merge_preview`, and conflict detection ahead of a promotion
//! attempt. Trunk is append-only and linear — promotion never falls back to
//! a merge commit (spec.md §9, "Promotion discipline").

use serde::Serialize;

use super::repo::GitRepo;
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct MergePreview {
    pub can_fast_forward: bool,
    pub commits_ahead: usize,
    pub commits_behind: usize,
    pub files_changed: usize,
    pub lines_changed: usize,
    pub files_details: Vec<String>,
    pub conflicts: Vec<String>,
    pub ready_to_promote: bool,
}

impl GitRepo {
    /// True iff `trunk_tip` is an ancestor of `workpad_tip` and the workpad
    /// has at least one commit beyond trunk (spec.md §4.2 `can_promote`).
    pub fn can_promote(&self, workpad_tip: &str, trunk_tip: &str) -> Result<(bool, String)> {
        if workpad_tip == trunk_tip {
            return Ok((false, "no_new_commits".to_string()));
        }
        if !self.is_ancestor(trunk_tip, workpad_tip)? {
            return Ok((false, "not_fast_forward".to_string()));
        }
        Ok((true, "fast_forward_eligible".to_string()))
    }

    /// Detect conflicting files between the workpad tip and trunk without
    /// mutating the working tree, using `git merge-tree --write-tree`
    /// (available from git 2.38). It exits 0 and prints just the merged
    /// tree OID on a clean merge, or exits 1 and prints the tree OID
    /// followed by a `--name-only` conflicted-file section (and then a
    /// blank line and informational messages) when there are conflicts.
    pub fn detect_merge_conflicts(&self, workpad_tip: &str, trunk_tip: &str) -> Result<Vec<String>> {
        let (success, stdout) = self.run_capturing(&["merge-tree", "--write-tree", "--name-only", trunk_tip, workpad_tip])?;
        if success {
            return Ok(Vec::new());
        }
        Ok(parse_conflict_files(&stdout))
    }

    pub fn merge_preview(&self, workpad_tip: &str, trunk_tip: &str) -> Result<MergePreview> {
        let (can_fast_forward, _reason) = self.can_promote(workpad_tip, trunk_tip)?;
        let commits_ahead = self.commit_count_between(trunk_tip, workpad_tip).unwrap_or(0);
        let commits_behind = self.commit_count_between(workpad_tip, trunk_tip).unwrap_or(0);
        let stats = self.diff_stats(trunk_tip, workpad_tip)?;
        let conflicts = if can_fast_forward {
            Vec::new()
        } else {
            self.detect_merge_conflicts(workpad_tip, trunk_tip).unwrap_or_default()
        };
        Ok(MergePreview {
            can_fast_forward,
            commits_ahead,
            commits_behind,
            files_changed: stats.files,
            lines_changed: stats.insertions + stats.deletions,
            files_details: stats.files_list,
            ready_to_promote: can_fast_forward && conflicts.is_empty(),
            conflicts,
        })
    }
}

/// Parse the conflicted-file names out of `merge-tree --name-only` stdout:
/// the first line is the written tree's OID, the following lines up to the
/// first blank line are one conflicted path each, and anything after the
/// blank line is informational and ignored.
fn parse_conflict_files(stdout: &str) -> Vec<String> {
    let mut lines = stdout.lines();
    lines.next();
    lines.take_while(|l| !l.trim().is_empty()).map(|l| l.trim().to_string()).collect()
}
