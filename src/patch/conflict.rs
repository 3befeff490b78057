//! Conflict detection ahead of applying a patch (spec.md §4.3
//! `detect_conflicts`), using `git apply --check` so the working tree is
//! never touched by a failed probe.

use crate::error::{EngineError, Result};
use crate::git::GitRepo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
    SafeToApply,
    ReviewRecommended,
    CarefulReviewRequired,
    ManualResolutionRequired,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Recommendation::SafeToApply => "safe_to_apply",
            Recommendation::ReviewRecommended => "review_recommended",
            Recommendation::CarefulReviewRequired => "careful_review_required",
            Recommendation::ManualResolutionRequired => "manual_resolution_required",
        };
        f.write_str(s)
    }
}

/// Run `git apply --check` against `diff_text` in `repo`'s working tree.
/// Returns the list of files `git` reports as conflicting; empty means the
/// patch would apply cleanly.
pub fn detect_conflicts(repo: &GitRepo, diff_text: &str) -> Result<Vec<String>> {
    match repo.run_with_stdin(&["apply", "--check"], diff_text.as_bytes()) {
        Ok(_) => Ok(Vec::new()),
        Err(EngineError::GitCommandError { stderr, .. }) => Ok(parse_conflicting_files(&stderr)),
        Err(e) => Err(e),
    }
}

fn parse_conflicting_files(stderr: &str) -> Vec<String> {
    let mut files = Vec::new();
    for line in stderr.lines() {
        if let Some(rest) = line.strip_prefix("error: patch failed: ") {
            if let Some((path, _)) = rest.rsplit_once(':') {
                files.push(path.to_string());
            }
        } else if let Some(rest) = line.strip_prefix("error: ") {
            if let Some(path) = rest.strip_suffix(": patch does not apply") {
                files.push(path.to_string());
            }
        }
    }
    files.sort();
    files.dedup();
    files
}

use super::stats::{Complexity, PatchStats};

/// Combine a patch's measured complexity with whether it would conflict
/// into the recommendation shown before `apply` (spec.md §4.3 `preview`).
pub fn recommend(stats: &PatchStats, conflicts: &[String]) -> Recommendation {
    if !conflicts.is_empty() {
        return Recommendation::ManualResolutionRequired;
    }
    match stats.complexity {
        Complexity::Trivial | Complexity::Simple => Recommendation::SafeToApply,
        Complexity::Moderate => Recommendation::ReviewRecommended,
        Complexity::Complex | Complexity::VeryComplex => Recommendation::CarefulReviewRequired,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_forces_manual_resolution_regardless_of_size() {
        let stats = PatchStats {
            files_changed: 1,
            insertions: 1,
            deletions: 0,
            total_changes: 1,
            complexity: Complexity::Trivial,
            files_list: vec!["a.txt".to_string()],
        };
        assert_eq!(
            recommend(&stats, &["a.txt".to_string()]),
            Recommendation::ManualResolutionRequired
        );
    }

    #[test]
    fn clean_trivial_patch_is_safe() {
        let stats = PatchStats {
            files_changed: 1,
            insertions: 1,
            deletions: 0,
            total_changes: 1,
            complexity: Complexity::Trivial,
            files_list: vec!["a.txt".to_string()],
        };
        assert_eq!(recommend(&stats, &[]), Recommendation::SafeToApply);
    }
}
