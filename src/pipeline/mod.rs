//! Auto-Merge pipeline (spec.md §4.7): composes the test orchestrator,
//! analyzer, gate, git engine, CI stage, and rollback handler into
//! `run_tests → analyze → evaluate_gate → [approve] promote → run_smoke →
//! [failed] rollback`. `promote` is the only stage that mutates trunk.

mod ci;
mod rollback;

pub use ci::{run_smoke, CiOutcome, CiStatus};
pub use rollback::{rollback, RollbackRecord};

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde::Serialize;

use crate::analyzer::{self, Analysis};
use crate::error::Result;
use crate::gate::{self, Decision, PromotionRules, Verdict};
use crate::git::GitRepo;
use crate::store::{Store, TestStatus as WorkpadTestStatus, WorkpadRecord, WorkpadStatus};
use crate::test_orchestrator::{self, ScheduleMode, TestBatchSummary, TestConfig};

#[derive(Debug, Clone, Serialize)]
pub struct AutoMergeReport {
    pub tests: TestBatchSummary,
    pub analysis: Analysis,
    pub decision: Decision,
    pub promoted: bool,
    pub promoted_commit: Option<String>,
    pub ci: Option<CiOutcome>,
    pub rollback: Option<RollbackRecord>,
}

/// Run the full auto-merge pipeline for `pad` against `repo`/`store`.
///
/// Each stage logs at `info` level so a caller tailing logs can follow the
/// pipeline's progress (spec.md §4.7 "each stage logs a structured record").
#[allow(clippy::too_many_arguments)]
pub fn run_auto_merge(
    store: &Store,
    repo: &GitRepo,
    pad: &WorkpadRecord,
    trunk: &str,
    test_plan: &[TestConfig],
    mode: ScheduleMode,
    rules: &PromotionRules,
    smoke_plan: Option<&[TestConfig]>,
    cancel: Arc<AtomicBool>,
) -> Result<AutoMergeReport> {
    repo.checkout(&pad.branch)?;
    log::info!("pipeline[{}]: running tests", pad.id);
    let tests = test_orchestrator::run(test_plan, repo.path(), mode, cancel.clone())?;

    log::info!("pipeline[{}]: analyzing results", pad.id);
    let analysis = analyzer::analyze(&tests);

    let pad_tip = repo.rev_parse("HEAD")?;
    let trunk_tip = {
        repo.checkout(trunk)?;
        let tip = repo.rev_parse("HEAD")?;
        repo.checkout(&pad.branch)?;
        tip
    };
    let merge_preview = repo.merge_preview(&pad_tip, &trunk_tip)?;

    log::info!("pipeline[{}]: evaluating gate", pad.id);
    let decision = gate::evaluate(rules, pad, Some(&analysis), &merge_preview);

    store.update_workpad(&pad.id, |w| {
        w.test_status = if analysis.status == analyzer::AnalysisStatus::Green {
            WorkpadTestStatus::Green
        } else {
            WorkpadTestStatus::Red
        };
        w.last_activity_at = chrono::Utc::now();
    })?;

    let mut promoted = false;
    let mut promoted_commit = None;
    let mut ci = None;
    let mut rollback_record = None;

    if decision.verdict == Verdict::Approve {
        log::info!("pipeline[{}]: promoting", pad.id);
        repo.checkout(trunk)?;
        let commit = repo.merge_ff_only(&pad.branch)?;
        store.update_workpad(&pad.id, |w| w.status = WorkpadStatus::Promoted)?;
        promoted = true;
        promoted_commit = Some(commit.clone());

        if let Some(smoke_plan) = smoke_plan {
            log::info!("pipeline[{}]: running smoke tests on trunk", pad.id);
            let outcome = run_smoke(smoke_plan, repo.path(), mode, cancel.clone())?;
            let needs_rollback = matches!(outcome.status, CiStatus::Failure | CiStatus::Unstable);
            if needs_rollback {
                log::info!("pipeline[{}]: smoke tests {:?}, rolling back", pad.id, outcome.status);
                let cause = format!("smoke tests {}", outcome.status);
                rollback_record = Some(rollback(store, repo, &pad.repo_id, trunk, &commit, cause)?);
            }
            ci = Some(outcome);
        }
    } else {
        log::info!("pipeline[{}]: gate verdict {:?}, not promoting", pad.id, decision.verdict);
    }

    Ok(AutoMergeReport {
        tests,
        analysis,
        decision,
        promoted,
        promoted_commit,
        ci,
        rollback: rollback_record,
    })
}
