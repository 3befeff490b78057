//! CI stage: a second `TestOrchestrator` invocation against trunk, run
//! after promotion, before the caller is told the promotion "stuck"
//! (spec.md §4.7 "Smoke tests").

use serde::Serialize;
use strum::Display;

use crate::test_orchestrator::{self, ScheduleMode, TestBatchSummary, TestConfig, TestStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CiStatus {
    Success,
    Failure,
    Unstable,
    Aborted,
}

#[derive(Debug, Clone, Serialize)]
pub struct CiOutcome {
    pub status: CiStatus,
    pub summary: TestBatchSummary,
}

/// Run `smoke_plan` against `trunk_path` and classify the outcome.
pub fn run_smoke(
    smoke_plan: &[TestConfig],
    trunk_path: &std::path::Path,
    mode: ScheduleMode,
    cancel: std::sync::Arc<std::sync::atomic::AtomicBool>,
) -> crate::error::Result<CiOutcome> {
    let summary = test_orchestrator::run(smoke_plan, trunk_path, mode, cancel.clone())?;

    let status = if cancel.load(std::sync::atomic::Ordering::SeqCst) {
        CiStatus::Aborted
    } else if summary.all_passed {
        CiStatus::Success
    } else if summary.results.iter().any(|r| r.status == TestStatus::Timeout) {
        CiStatus::Unstable
    } else {
        CiStatus::Failure
    };

    Ok(CiOutcome { status, summary })
}
