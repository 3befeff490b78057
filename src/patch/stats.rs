//! Patch statistics and complexity tiering (spec.md §4.3 `get_stats`).

use serde::Serialize;
use strum::Display;

use super::parse::ParsedPatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Trivial,
    Simple,
    Moderate,
    Complex,
    VeryComplex,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatchStats {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
    pub total_changes: usize,
    pub complexity: Complexity,
    pub files_list: Vec<String>,
}

fn count_hunk_lines(hunk_lines: &[String]) -> (usize, usize) {
    let mut insertions = 0;
    let mut deletions = 0;
    for line in hunk_lines {
        if line.starts_with('+') {
            insertions += 1;
        } else if line.starts_with('-') {
            deletions += 1;
        }
    }
    (insertions, deletions)
}

/// Classify total changed-line count and file span into a complexity tier.
///
/// Tiers per spec.md §4.3:
/// trivial   < 10 changes,  1 file
/// simple    < 50 changes,  ≤ 3 files
/// moderate  < 200 changes, ≤ 10 files
/// complex   < 500 changes, ≤ 20 files
/// very_complex otherwise
fn classify(total_changes: usize, files_changed: usize) -> Complexity {
    if total_changes < 10 && files_changed <= 1 {
        Complexity::Trivial
    } else if total_changes < 50 && files_changed <= 3 {
        Complexity::Simple
    } else if total_changes < 200 && files_changed <= 10 {
        Complexity::Moderate
    } else if total_changes < 500 && files_changed <= 20 {
        Complexity::Complex
    } else {
        Complexity::VeryComplex
    }
}

pub fn get_stats(patch: &ParsedPatch) -> PatchStats {
    let mut insertions = 0;
    let mut deletions = 0;
    for file in &patch.files {
        for hunk in &file.hunks {
            let (ins, del) = count_hunk_lines(&hunk.lines);
            insertions += ins;
            deletions += del;
        }
    }
    let files_changed = patch.files.len();
    let total_changes = insertions + deletions;
    let files_list = patch.files.iter().map(|f| f.path().to_string()).collect();
    PatchStats {
        files_changed,
        insertions,
        deletions,
        total_changes,
        complexity: classify(total_changes, files_changed),
        files_list,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::parse::parse;

    #[test]
    fn single_line_add_is_trivial() {
        let patch = parse("--- a/x\n+++ b/x\n@@ -1,1 +1,2 @@\n one\n+two\n").unwrap();
        let stats = get_stats(&patch);
        assert_eq!(stats.insertions, 1);
        assert_eq!(stats.complexity, Complexity::Trivial);
        assert_eq!(stats.files_list, vec!["x".to_string()]);
    }

    #[test]
    fn many_files_pushes_to_very_complex() {
        assert_eq!(classify(5, 25), Complexity::VeryComplex);
        assert_eq!(classify(600, 2), Complexity::VeryComplex);
    }

    #[test]
    fn boundary_at_simple_moderate() {
        assert_eq!(classify(49, 3), Complexity::Simple);
        assert_eq!(classify(50, 3), Complexity::Moderate);
        assert_eq!(classify(49, 4), Complexity::Moderate);
    }
}
