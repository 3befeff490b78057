//! Splitting a patch into per-file fragments and recombining them
//! (spec.md §4.3 `split_by_file`, `combine`), preserving enough information
//! that `combine(split_by_file(p))` reproduces an equivalent patch.

use super::parse::{parse, ParsedFile};
use crate::error::Result;

/// One file's worth of diff text, still a complete standalone unified diff
/// that `parse` can round-trip on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePatch {
    pub path: String,
    pub diff_text: String,
}

fn header_line(prefix: &str, path: Option<&str>) -> String {
    match path {
        Some(p) => format!("{prefix} a/{p}"),
        None => format!("{prefix} /dev/null"),
    }
}

fn render_file(file: &ParsedFile) -> String {
    let mut out = String::new();
    out.push_str(&header_line("---", file.old_path.as_deref()));
    out.push('\n');
    // `+++` headers use the b/ prefix by convention; `render_file` only
    // ever re-renders paths `parse` already stripped of a/ or b/.
    let plus = match file.new_path.as_deref() {
        Some(p) => format!("+++ b/{p}"),
        None => "+++ /dev/null".to_string(),
    };
    out.push_str(&plus);
    out.push('\n');
    for hunk in &file.hunks {
        out.push_str(&hunk.header);
        out.push('\n');
        for line in &hunk.lines {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Split `diff_text` into one standalone diff per file.
pub fn split_by_file(diff_text: &str) -> Result<Vec<FilePatch>> {
    let patch = parse(diff_text)?;
    Ok(patch
        .files
        .iter()
        .map(|file| FilePatch {
            path: file.path().to_string(),
            diff_text: render_file(file),
        })
        .collect())
}

/// Recombine file patches (in the order given) into one unified diff.
pub fn combine(parts: &[FilePatch]) -> String {
    parts.iter().map(|p| p.diff_text.as_str()).collect::<Vec<_>>().join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FILE_DIFF: &str = "--- a/one.txt\n+++ b/one.txt\n@@ -1,1 +1,2 @@\n a\n+b\n--- a/two.txt\n+++ b/two.txt\n@@ -1,1 +1,2 @@\n c\n+d\n";

    #[test]
    fn split_produces_one_entry_per_file() {
        let parts = split_by_file(TWO_FILE_DIFF).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].path, "one.txt");
        assert_eq!(parts[1].path, "two.txt");
    }

    #[test]
    fn split_parts_are_independently_parseable() {
        let parts = split_by_file(TWO_FILE_DIFF).unwrap();
        for part in &parts {
            let reparsed = parse(&part.diff_text).unwrap();
            assert_eq!(reparsed.files.len(), 1);
        }
    }

    #[test]
    fn combine_round_trips_file_count() {
        let parts = split_by_file(TWO_FILE_DIFF).unwrap();
        let combined = combine(&parts);
        let reparsed = parse(&combined).unwrap();
        assert_eq!(reparsed.files.len(), 2);
    }
}
