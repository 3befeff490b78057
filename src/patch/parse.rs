//! Unified diff parsing (spec.md §4.3 `parse`).
//!
//! Format: standard unified diff (`--- a/...`, `+++ b/...`, `@@` hunks),
//! UTF-8, LF line endings; creation uses `/dev/null` as the source header,
//! deletion uses `/dev/null` as the target header (spec.md §6).

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub header: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    pub is_create: bool,
    pub is_delete: bool,
    pub hunks: Vec<Hunk>,
}

impl ParsedFile {
    /// The path this file entry is about, preferring the new path (matches
    /// a modify/create); falls back to the old path for deletions.
    pub fn path(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPatch {
    pub files: Vec<ParsedFile>,
}

fn strip_ab_prefix(path: &str) -> String {
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
        .to_string()
}

/// Parse unified diff text into per-file hunks.
///
/// Fails with `MalformedPatch` if there is no recognizable `--- `/`+++ `
/// header pair followed by at least one `@@` hunk (spec.md §3 "Patch
/// Validity").
pub fn parse(diff_text: &str) -> Result<ParsedPatch> {
    let mut files = Vec::new();
    let mut current: Option<ParsedFile> = None;
    let mut current_hunk: Option<Hunk> = None;

    let lines: Vec<&str> = diff_text.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if let Some(rest) = line.strip_prefix("--- ") {
            finish_hunk(&mut current, &mut current_hunk);
            finish_file(&mut files, &mut current);
            let old_path = if rest.trim() == "/dev/null" {
                None
            } else {
                Some(strip_ab_prefix(rest.trim()))
            };
            current = Some(ParsedFile {
                old_path,
                new_path: None,
                is_create: false,
                is_delete: false,
                hunks: Vec::new(),
            });
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            let new_path = if rest.trim() == "/dev/null" {
                None
            } else {
                Some(strip_ab_prefix(rest.trim()))
            };
            match current.as_mut() {
                Some(file) => {
                    file.is_create = file.old_path.is_none() && new_path.is_some();
                    file.is_delete = new_path.is_none() && file.old_path.is_some();
                    file.new_path = new_path;
                }
                None => {
                    return Err(EngineError::MalformedPatch {
                        line: i + 1,
                        hint: "'+++' header without preceding '---' header".to_string(),
                    });
                }
            }
        } else if line.starts_with("@@") {
            let Some(end) = line[2..].find("@@") else {
                return Err(EngineError::MalformedPatch {
                    line: i + 1,
                    hint: "malformed hunk header, missing closing '@@'".to_string(),
                });
            };
            finish_hunk(&mut current, &mut current_hunk);
            if current.is_none() {
                return Err(EngineError::MalformedPatch {
                    line: i + 1,
                    hint: "hunk header without a preceding file header".to_string(),
                });
            }
            current_hunk = Some(Hunk {
                header: line[..2 + end + 2].to_string(),
                lines: Vec::new(),
            });
        } else if let Some(hunk) = current_hunk.as_mut() {
            if line.starts_with('+') || line.starts_with('-') || line.starts_with(' ') || line.starts_with('\\') {
                hunk.lines.push(line.to_string());
            }
            // Lines outside this set (e.g. stray blank separators between
            // file blocks) are ignored rather than treated as malformed —
            // real-world diffs from varied tools are a little loose here.
        }
        i += 1;
    }

    finish_hunk(&mut current, &mut current_hunk);
    finish_file(&mut files, &mut current);

    if files.is_empty() {
        return Err(EngineError::MalformedPatch {
            line: 0,
            hint: "no file headers found".to_string(),
        });
    }
    if files.iter().all(|f| f.hunks.is_empty()) {
        return Err(EngineError::MalformedPatch {
            line: 0,
            hint: "no hunks found".to_string(),
        });
    }

    Ok(ParsedPatch { files })
}

fn finish_hunk(current: &mut Option<ParsedFile>, hunk: &mut Option<Hunk>) {
    if let (Some(file), Some(h)) = (current.as_mut(), hunk.take()) {
        file.hunks.push(h);
    }
}

fn finish_file(files: &mut Vec<ParsedFile>, current: &mut Option<ParsedFile>) {
    if let Some(file) = current.take() {
        files.push(file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_DIFF: &str = "--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1,2 +1,3 @@\n fn main() {}\n+// added\n mod tests;\n";

    #[test]
    fn parses_single_file_single_hunk() {
        let patch = parse(SIMPLE_DIFF).unwrap();
        assert_eq!(patch.files.len(), 1);
        assert_eq!(patch.files[0].path(), "src/lib.rs");
        assert_eq!(patch.files[0].hunks.len(), 1);
        assert_eq!(patch.files[0].hunks[0].lines.len(), 3);
    }

    #[test]
    fn creation_has_no_old_path() {
        let diff = "--- /dev/null\n+++ b/new.rs\n@@ -0,0 +1,1 @@\n+fn new() {}\n";
        let patch = parse(diff).unwrap();
        assert!(patch.files[0].is_create);
        assert_eq!(patch.files[0].old_path, None);
    }

    #[test]
    fn deletion_has_no_new_path() {
        let diff = "--- a/old.rs\n+++ /dev/null\n@@ -1,1 +0,0 @@\n-fn old() {}\n";
        let patch = parse(diff).unwrap();
        assert!(patch.files[0].is_delete);
        assert_eq!(patch.files[0].new_path, None);
    }

    #[test]
    fn empty_diff_is_malformed() {
        let err = parse("").unwrap_err();
        assert!(matches!(err, EngineError::MalformedPatch { .. }));
    }

    #[test]
    fn header_without_hunk_is_malformed() {
        let err = parse("--- a/x\n+++ b/x\n").unwrap_err();
        assert!(matches!(err, EngineError::MalformedPatch { .. }));
    }

    #[test]
    fn multi_file_patch_parses_each_file() {
        let diff = format!("{SIMPLE_DIFF}--- a/README.md\n+++ b/README.md\n@@ -1,1 +1,2 @@\n hello\n+world\n");
        let patch = parse(&diff).unwrap();
        assert_eq!(patch.files.len(), 2);
        assert_eq!(patch.files[1].path(), "README.md");
    }
}
