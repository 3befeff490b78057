//! Promotion Gate (spec.md §4.6): evaluates promotion rules against a
//! workpad and produces a `Decision`. Every rule is evaluated (not
//! short-circuited) so the reason list is always complete.

use serde::Serialize;
use strum::Display;

use crate::analyzer::{Analysis, AnalysisStatus};
use crate::git::MergePreview;
use crate::store::{WorkpadRecord, WorkpadStatus};

#[derive(Debug, Clone, Serialize)]
pub struct PromotionRules {
    pub require_tests: bool,
    pub require_all_tests_pass: bool,
    pub require_fast_forward: bool,
    pub max_files_changed: Option<usize>,
    pub max_lines_changed: Option<usize>,
    pub allow_merge_conflicts: bool,
}

impl Default for PromotionRules {
    fn default() -> Self {
        Self {
            require_tests: true,
            require_all_tests_pass: true,
            require_fast_forward: true,
            max_files_changed: None,
            max_lines_changed: None,
            allow_merge_conflicts: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approve,
    Reject,
    ManualReview,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeSize {
    pub files_changed: usize,
    pub lines_changed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub verdict: Verdict,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub change_size: ChangeSize,
}

/// Evaluate `rules` against `workpad`'s current state, optional test
/// `analysis`, and the git engine's `merge_preview`.
pub fn evaluate(rules: &PromotionRules, workpad: &WorkpadRecord, analysis: Option<&Analysis>, merge_preview: &MergePreview) -> Decision {
    let mut reasons = Vec::new();
    let mut warnings = Vec::new();
    let mut reject = false;

    if workpad.status != WorkpadStatus::Active {
        reasons.push(format!("workpad is not active (status: {})", workpad.status));
        reject = true;
    }

    if rules.require_tests && analysis.is_none() {
        reasons.push("no test analysis supplied".to_string());
        reject = true;
    }

    if rules.require_all_tests_pass {
        match analysis {
            Some(a) if a.status == AnalysisStatus::Green => {}
            Some(a) => {
                let failed = a.totals.get("failed").copied().unwrap_or(0);
                let timeout = a.totals.get("timeout").copied().unwrap_or(0);
                let error = a.totals.get("error").copied().unwrap_or(0);
                reasons.push(format!("tests failed: {failed} failed, {timeout} timeout, {error} error"));
                reject = true;
            }
            None => {}
        }
    }

    if rules.require_fast_forward && !merge_preview.can_fast_forward {
        reasons.push("fast-forward is not possible".to_string());
        reject = true;
    }

    if !merge_preview.conflicts.is_empty() {
        reasons.push(format!("merge conflicts in: {}", merge_preview.conflicts.join(", ")));
        reject = true;
    }

    let change_size = ChangeSize {
        files_changed: merge_preview.files_changed,
        lines_changed: merge_preview.lines_changed,
    };

    if let Some(max_files) = rules.max_files_changed {
        if change_size.files_changed > max_files {
            warnings.push(format!("files changed ({}) exceeds max_files_changed ({max_files})", change_size.files_changed));
        }
    }
    if let Some(max_lines) = rules.max_lines_changed {
        if change_size.lines_changed > max_lines {
            warnings.push(format!(
                "lines changed ({}) exceeds max_lines_changed ({max_lines})",
                change_size.lines_changed
            ));
        }
    }

    let verdict = if reject {
        Verdict::Reject
    } else if !warnings.is_empty() {
        Verdict::ManualReview
    } else {
        Verdict::Approve
    };

    Decision {
        verdict,
        reasons,
        warnings,
        change_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn active_workpad() -> WorkpadRecord {
        WorkpadRecord {
            id: "p1".to_string(),
            repo_id: "r1".to_string(),
            title: "add login".to_string(),
            branch: "workpad/p1".to_string(),
            status: WorkpadStatus::Active,
            test_status: crate::store::TestStatus::Green,
            created_at: Utc::now(),
            last_activity_at: Utc::now(),
            checkpoints: Vec::new(),
        }
    }

    fn clean_preview() -> MergePreview {
        MergePreview {
            can_fast_forward: true,
            commits_ahead: 1,
            commits_behind: 0,
            files_changed: 2,
            lines_changed: 12,
            files_details: vec!["a.rs".to_string(), "b.rs".to_string()],
            conflicts: Vec::new(),
            ready_to_promote: true,
        }
    }

    #[test]
    fn approves_when_all_rules_pass_and_no_analysis_required() {
        let rules = PromotionRules {
            require_tests: false,
            require_all_tests_pass: false,
            ..Default::default()
        };
        let decision = evaluate(&rules, &active_workpad(), None, &clean_preview());
        assert_eq!(decision.verdict, Verdict::Approve);
        assert!(decision.reasons.is_empty());
    }

    #[test]
    fn rejects_when_not_fast_forward() {
        let mut preview = clean_preview();
        preview.can_fast_forward = false;
        let rules = PromotionRules {
            require_tests: false,
            require_all_tests_pass: false,
            ..Default::default()
        };
        let decision = evaluate(&rules, &active_workpad(), None, &preview);
        assert_eq!(decision.verdict, Verdict::Reject);
    }

    #[test]
    fn conflicts_always_reject_even_with_allow_merge_conflicts() {
        let mut preview = clean_preview();
        preview.conflicts = vec!["src/app.py".to_string()];
        let rules = PromotionRules {
            require_tests: false,
            require_all_tests_pass: false,
            allow_merge_conflicts: true,
            ..Default::default()
        };
        let decision = evaluate(&rules, &active_workpad(), None, &preview);
        assert_eq!(decision.verdict, Verdict::Reject);
    }

    #[test]
    fn over_limit_files_is_manual_review_not_reject() {
        let rules = PromotionRules {
            require_tests: false,
            require_all_tests_pass: false,
            max_files_changed: Some(1),
            ..Default::default()
        };
        let decision = evaluate(&rules, &active_workpad(), None, &clean_preview());
        assert_eq!(decision.verdict, Verdict::ManualReview);
        assert!(!decision.warnings.is_empty());
    }

    #[test]
    fn over_limit_files_stays_manual_review_even_with_allow_merge_conflicts() {
        let rules = PromotionRules {
            require_tests: false,
            require_all_tests_pass: false,
            max_files_changed: Some(1),
            allow_merge_conflicts: true,
            ..Default::default()
        };
        let decision = evaluate(&rules, &active_workpad(), None, &clean_preview());
        assert_eq!(decision.verdict, Verdict::ManualReview);
    }

    #[test]
    fn over_limit_lines_is_manual_review() {
        let rules = PromotionRules {
            require_tests: false,
            require_all_tests_pass: false,
            max_lines_changed: Some(5),
            ..Default::default()
        };
        let decision = evaluate(&rules, &active_workpad(), None, &clean_preview());
        assert_eq!(decision.verdict, Verdict::ManualReview);
        assert!(decision.warnings.iter().any(|w| w.contains("lines changed")));
    }
}
