//! Failure categorization and pattern merging (spec.md §4.5
//! "Categorization", "Pattern merging", "Extraction").

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use strum::Display;

use super::FailurePattern;
use crate::test_orchestrator::{TestResult, TestStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Assertion,
    Import,
    Syntax,
    Timeout,
    Dependency,
    Network,
    Permission,
    Resource,
    Unknown,
}

static SIGNATURES: Lazy<Vec<(FailureCategory, Regex)>> = Lazy::new(|| {
    vec![
        (FailureCategory::Assertion, Regex::new(r"(?i)assert(ion)?error|expected .* got|assertion failed").unwrap()),
        (FailureCategory::Import, Regex::new(r"(?i)(modulenotfounderror|no module named|cannot find module|unresolved import)").unwrap()),
        (FailureCategory::Syntax, Regex::new(r"(?i)(syntaxerror|unexpected token|parse error)").unwrap()),
        (FailureCategory::Dependency, Regex::new(r"(?i)(dependency .* not (found|satisfied)|version conflict|package .* missing)").unwrap()),
        (FailureCategory::Network, Regex::new(r"(?i)(connection refused|network (is )?unreachable|timed out connecting|dns lookup failed)").unwrap()),
        (FailureCategory::Permission, Regex::new(r"(?i)(permission denied|access denied|eacces)").unwrap()),
        (FailureCategory::Resource, Regex::new(r"(?i)(out of memory|oom|disk full|no space left|too many open files)").unwrap()),
    ]
});

static TRACEBACK_FRAME: Lazy<Regex> = Lazy::new(|| Regex::new(r#"([./][\w./\-]+\.\w+)[:"](\d+)"#).unwrap());

fn categorize(status: TestStatus, text: &str) -> FailureCategory {
    if status == TestStatus::Timeout {
        return FailureCategory::Timeout;
    }
    for (category, re) in SIGNATURES.iter() {
        if re.is_match(text) {
            return *category;
        }
    }
    FailureCategory::Unknown
}

fn canonicalize(text: &str) -> String {
    // Representative message is the first non-blank line, trimmed.
    text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim().to_string()
}

fn extract_location(text: &str) -> Option<String> {
    TRACEBACK_FRAME.captures(text).map(|c| format!("{}:{}", &c[1], &c[2]))
}

fn suggested_actions(category: FailureCategory) -> Vec<String> {
    match category {
        FailureCategory::Assertion => vec![
            "review the failing assertion's expected vs actual value".to_string(),
            "check for a recent behavior change in the code under test".to_string(),
        ],
        FailureCategory::Import => vec![
            "verify dependency install".to_string(),
            "check module paths".to_string(),
        ],
        FailureCategory::Syntax => vec!["fix the reported syntax error before re-running".to_string()],
        FailureCategory::Timeout => vec![
            "profile the test for a hang or infinite loop".to_string(),
            "increase timeout_seconds if the workload is legitimately slow".to_string(),
        ],
        FailureCategory::Dependency => vec!["pin or install the missing/conflicting dependency".to_string()],
        FailureCategory::Network => vec!["check test-environment network access or mock the external call".to_string()],
        FailureCategory::Permission => vec!["run with appropriate file/process permissions".to_string()],
        FailureCategory::Resource => vec!["reduce resource usage or raise sandbox limits".to_string()],
        FailureCategory::Unknown => vec!["inspect stdout/stderr manually".to_string()],
    }
}

pub fn merge_patterns(failing: &[&TestResult]) -> Vec<FailurePattern> {
    let mut patterns: Vec<FailurePattern> = Vec::new();
    for result in failing {
        let combined = format!("{}\n{}", result.stderr, result.stdout);
        let category = categorize(result.status, &combined);
        let message = canonicalize(&combined);
        let location = extract_location(&combined);

        if let Some(existing) = patterns
            .iter_mut()
            .find(|p| p.category == category && p.representative_message == message)
        {
            existing.count += 1;
            existing.test_names.push(result.name.clone());
        } else {
            patterns.push(FailurePattern {
                category,
                representative_message: message,
                location,
                count: 1,
                suggested_actions: suggested_actions(category),
                test_names: vec![result.name.clone()],
            });
        }
    }
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn failed(name: &str, stderr: &str) -> TestResult {
        TestResult {
            name: name.to_string(),
            status: TestStatus::Failed,
            exit_code: Some(1),
            duration_ms: 1,
            stdout: String::new(),
            stderr: stderr.to_string(),
            started_at: Utc::now(),
        }
    }

    #[test]
    fn identical_failures_collapse_into_one_pattern() {
        let a = failed("a", "AssertionError: expected 1 got 2");
        let b = failed("b", "AssertionError: expected 1 got 2");
        let results = vec![&a, &b];
        let patterns = merge_patterns(&results);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].count, 2);
    }

    #[test]
    fn location_extracted_from_traceback_frame() {
        let a = failed("a", "Traceback:\n  File \"src/app.py:42\", in handler\nAssertionError");
        let results = vec![&a];
        let patterns = merge_patterns(&results);
        assert_eq!(patterns[0].location.as_deref(), Some("src/app.py:42"));
    }

    #[test]
    fn unrecognized_text_is_unknown() {
        let a = failed("a", "something weird happened");
        let results = vec![&a];
        let patterns = merge_patterns(&results);
        assert_eq!(patterns[0].category, FailureCategory::Unknown);
    }

    #[rstest::rstest]
    #[case("AssertionError: expected true got false", FailureCategory::Assertion)]
    #[case("ModuleNotFoundError: no module named 'requests'", FailureCategory::Import)]
    #[case("SyntaxError: unexpected token '}'", FailureCategory::Syntax)]
    #[case("dependency 'libfoo' not satisfied", FailureCategory::Dependency)]
    #[case("connection refused by peer", FailureCategory::Network)]
    #[case("permission denied: /var/lock", FailureCategory::Permission)]
    #[case("out of memory: kill process", FailureCategory::Resource)]
    fn signature_table_matches_known_failure_text(#[case] text: &str, #[case] expected: FailureCategory) {
        assert_eq!(categorize(TestStatus::Failed, text), expected);
    }

    #[test]
    fn timeout_status_always_wins_over_text_signatures() {
        assert_eq!(categorize(TestStatus::Timeout, "AssertionError: whatever"), FailureCategory::Timeout);
    }
}
