//! Applying a patch to a workpad's working tree (spec.md §4.3 `apply`,
//! `preview`): all-or-nothing, restoring the tree if anything goes wrong
//! partway, optionally re-validating syntax first.

use serde::Serialize;

use super::conflict::{detect_conflicts, recommend, Recommendation};
use super::parse::parse;
use super::stats::{get_stats, PatchStats};
use crate::error::{EngineError, Result};
use crate::git::GitRepo;

#[derive(Debug, Clone, Serialize)]
pub struct PatchPreview {
    pub stats: PatchStats,
    pub conflicts: Vec<String>,
    #[serde(serialize_with = "serialize_recommendation")]
    pub recommendation: Recommendation,
}

fn serialize_recommendation<S: serde::Serializer>(r: &Recommendation, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&r.to_string())
}

/// Parse, measure, and probe `diff_text` against `repo`'s current working
/// tree without applying it (spec.md §4.3 `preview`).
pub fn preview(repo: &GitRepo, diff_text: &str) -> Result<PatchPreview> {
    let parsed = parse(diff_text)?;
    let stats = get_stats(&parsed);
    let conflicts = detect_conflicts(repo, diff_text)?;
    let recommendation = recommend(&stats, &conflicts);
    Ok(PatchPreview {
        stats,
        conflicts,
        recommendation,
    })
}

/// Validate `diff_text` parses as a well-formed unified diff without
/// touching the working tree (spec.md §4.3 `validate_syntax`).
pub fn validate_syntax(diff_text: &str) -> Result<()> {
    parse(diff_text).map(|_| ())
}

/// Apply `diff_text` to `repo`'s working tree and commit the result.
///
/// All-or-nothing: if `git apply` fails partway, or the subsequent commit
/// fails, the working tree is restored to its pre-apply state via
/// `git checkout -- .` + `git clean -fd` before returning the error, so a
/// caller never observes a half-applied patch (spec.md §4.3 "Atomicity").
pub fn apply(repo: &GitRepo, diff_text: &str, message: &str, author: &str, validate: bool) -> Result<String> {
    if validate {
        validate_syntax(diff_text)?;
        let conflicts = detect_conflicts(repo, diff_text)?;
        if !conflicts.is_empty() {
            return Err(EngineError::PatchConflict { files: conflicts });
        }
    }

    let result = repo
        .run_with_stdin(&["apply", "--whitespace=nowarn"], diff_text.as_bytes())
        .and_then(|_| repo.commit_all(message, author));

    match result {
        Ok(commit) => Ok(commit),
        Err(e) => {
            restore_tree(repo);
            Err(e)
        }
    }
}

fn restore_tree(repo: &GitRepo) {
    let _ = repo.run(&["checkout", "--quiet", "--", "."]);
    let _ = repo.run(&["clean", "-fd", "--quiet"]);
}
