//! `TestResult` and batch aggregation (spec.md §3 "Test Result", §4.4
//! "Aggregation").

use std::collections::HashMap;

use serde::Serialize;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Timeout,
    Error,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub name: String,
    pub status: TestStatus,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub stdout: String,
    pub stderr: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OverallColor {
    Green,
    Red,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestBatchSummary {
    pub results: Vec<TestResult>,
    pub all_passed: bool,
    pub totals_by_status: HashMap<String, usize>,
    pub wall_clock_ms: u64,
    pub overall: OverallColor,
}

pub fn summarize(results: Vec<TestResult>, wall_clock_ms: u64) -> TestBatchSummary {
    let mut totals_by_status: HashMap<String, usize> = HashMap::new();
    for r in &results {
        *totals_by_status.entry(r.status.to_string()).or_insert(0) += 1;
    }
    let all_passed = results.iter().all(|r| r.status == TestStatus::Passed);
    TestBatchSummary {
        overall: if all_passed { OverallColor::Green } else { OverallColor::Red },
        all_passed,
        totals_by_status,
        wall_clock_ms,
        results,
    }
}
