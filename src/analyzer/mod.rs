//! Test Analyzer (spec.md §4.5): pure-function diagnosis of a completed
//! test batch — no I/O, no subprocess, no mutation.

mod categorize;
mod report;

pub use categorize::FailureCategory;

use serde::Serialize;
use strum::Display;

use crate::test_orchestrator::{TestBatchSummary, TestResult, TestStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FixComplexity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailurePattern {
    pub category: FailureCategory,
    pub representative_message: String,
    pub location: Option<String>,
    pub count: usize,
    pub suggested_actions: Vec<String>,
    pub test_names: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Green,
    Red,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub status: AnalysisStatus,
    pub totals: std::collections::HashMap<String, usize>,
    pub patterns: Vec<FailurePattern>,
    pub overall_complexity: FixComplexity,
    pub formatted_report: String,
}

/// Analyze a completed test batch. Pure: depends only on its input.
pub fn analyze(summary: &TestBatchSummary) -> Analysis {
    let failing: Vec<&TestResult> = summary
        .results
        .iter()
        .filter(|r| !matches!(r.status, TestStatus::Passed | TestStatus::Skipped))
        .collect();

    let patterns = categorize::merge_patterns(&failing);
    let overall_complexity = estimate_complexity(&patterns);
    let status = if summary.all_passed { AnalysisStatus::Green } else { AnalysisStatus::Red };
    let formatted_report = report::format_report(status, &summary.totals_by_status, &patterns);

    Analysis {
        status,
        totals: summary.totals_by_status.clone(),
        patterns,
        overall_complexity,
        formatted_report,
    }
}

fn estimate_complexity(patterns: &[FailurePattern]) -> FixComplexity {
    let has_resource_or_unknown = patterns
        .iter()
        .any(|p| matches!(p.category, FailureCategory::Resource | FailureCategory::Unknown));
    if patterns.len() > 5 || has_resource_or_unknown {
        FixComplexity::High
    } else if patterns.len() <= 2 {
        FixComplexity::Low
    } else {
        FixComplexity::Medium
    }
}
