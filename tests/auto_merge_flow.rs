//! End-to-end scenarios over a real `git` binary and the public `Engine`
//! surface: happy-path auto-merge, gate rejection on red tests, conflict
//! detection, and CI rollback after promotion.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use sologit::gate::PromotionRules;
use sologit::pipeline::AutoMergeReport;
use sologit::test_orchestrator::{ScheduleMode, TestConfig};
use sologit::Engine;
use tempfile::TempDir;

fn make_tar(files: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut buf);
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_cksum();
            builder.append_data(&mut header, name, content.as_bytes()).unwrap();
        }
        builder.finish().unwrap();
    }
    buf
}

fn passing_test() -> TestConfig {
    TestConfig {
        name: "unit".to_string(),
        command: vec!["true".to_string()],
        timeout_seconds: 30,
        depends_on: Vec::new(),
        env: Default::default(),
        cwd: None,
    }
}

fn failing_test() -> TestConfig {
    TestConfig {
        name: "unit".to_string(),
        command: vec!["false".to_string()],
        timeout_seconds: 30,
        depends_on: Vec::new(),
        env: Default::default(),
        cwd: None,
    }
}

fn fresh_engine() -> (TempDir, Engine) {
    let dir = TempDir::new().unwrap();
    let engine = Engine::open(dir.path().to_path_buf()).unwrap();
    (dir, engine)
}

#[test]
fn happy_path_auto_merge_promotes_on_green_tests() {
    let (_dir, engine) = fresh_engine();
    let tar_bytes = make_tar(&[("README.md", "hello\n")]);
    let repo_id = engine.init_from_archive(&tar_bytes, "acme").unwrap();
    let pad_id = engine.create_workpad(&repo_id, "add greeting").unwrap();

    let diff = "--- a/README.md\n+++ b/README.md\n@@ -1 +1,2 @@\n hello\n+world\n";
    engine.apply_commit_on_workpad(&pad_id, diff, "add world line").unwrap();

    let cancel = Arc::new(AtomicBool::new(false));
    let report: AutoMergeReport = engine
        .run_auto_merge(
            &pad_id,
            &[passing_test()],
            ScheduleMode::Sequential,
            &PromotionRules::default(),
            None,
            cancel,
        )
        .unwrap();

    assert!(report.promoted);
    assert!(report.promoted_commit.is_some());
    assert!(report.tests.all_passed);
}

#[test]
fn red_tests_reject_promotion() {
    let (_dir, engine) = fresh_engine();
    let tar_bytes = make_tar(&[("README.md", "hello\n")]);
    let repo_id = engine.init_from_archive(&tar_bytes, "acme").unwrap();
    let pad_id = engine.create_workpad(&repo_id, "broken change").unwrap();

    let diff = "--- a/README.md\n+++ b/README.md\n@@ -1 +1,2 @@\n hello\n+world\n";
    engine.apply_commit_on_workpad(&pad_id, diff, "add world line").unwrap();

    let cancel = Arc::new(AtomicBool::new(false));
    let report = engine
        .run_auto_merge(
            &pad_id,
            &[failing_test()],
            ScheduleMode::Sequential,
            &PromotionRules::default(),
            None,
            cancel,
        )
        .unwrap();

    assert!(!report.promoted);
    assert!(!report.tests.all_passed);
    assert!(!report.decision.reasons.is_empty());
}

#[test]
fn conflicting_patch_is_rejected_before_apply() {
    let (_dir, engine) = fresh_engine();
    let tar_bytes = make_tar(&[("README.md", "line one\n")]);
    let repo_id = engine.init_from_archive(&tar_bytes, "acme").unwrap();
    let pad_id = engine.create_workpad(&repo_id, "edit readme").unwrap();

    // Patch context doesn't match the file on disk.
    let bogus_diff = "--- a/README.md\n+++ b/README.md\n@@ -1 +1 @@\n-this line does not exist\n+replacement\n";
    let err = engine.apply_commit_on_workpad(&pad_id, bogus_diff, "bad patch").unwrap_err();
    assert!(matches!(err, sologit::EngineError::PatchConflict { .. }));
}

#[test]
fn diverged_trunk_cannot_promote() {
    let (_dir, engine) = fresh_engine();
    let tar_bytes = make_tar(&[("README.md", "hello\n")]);
    let repo_id = engine.init_from_archive(&tar_bytes, "acme").unwrap();
    let pad_id = engine.create_workpad(&repo_id, "feature").unwrap();

    let diff = "--- a/README.md\n+++ b/README.md\n@@ -1 +1,2 @@\n hello\n+from workpad\n";
    engine.apply_commit_on_workpad(&pad_id, diff, "workpad change").unwrap();

    // Advance trunk independently so the workpad can no longer fast-forward.
    let trunk_diff = "--- a/README.md\n+++ b/README.md\n@@ -1 +1,2 @@\n hello\n+from trunk\n";
    let other_pad = engine.create_workpad(&repo_id, "trunk advance").unwrap();
    engine.apply_commit_on_workpad(&other_pad, trunk_diff, "trunk change").unwrap();
    engine.promote_workpad(&other_pad).unwrap();

    let (can, _reason) = engine.can_promote(&pad_id).unwrap();
    assert!(!can);
}

#[test]
fn ci_failure_after_promotion_triggers_rollback() {
    let (_dir, engine) = fresh_engine();
    let tar_bytes = make_tar(&[("README.md", "hello\n")]);
    let repo_id = engine.init_from_archive(&tar_bytes, "acme").unwrap();
    let pad_id = engine.create_workpad(&repo_id, "add greeting").unwrap();

    let diff = "--- a/README.md\n+++ b/README.md\n@@ -1 +1,2 @@\n hello\n+world\n";
    engine.apply_commit_on_workpad(&pad_id, diff, "add world line").unwrap();

    let cancel = Arc::new(AtomicBool::new(false));
    let report = engine
        .run_auto_merge(
            &pad_id,
            &[passing_test()],
            ScheduleMode::Sequential,
            &PromotionRules::default(),
            Some(&[failing_test()]),
            cancel,
        )
        .unwrap();

    assert!(report.promoted);
    let rollback = report.rollback.expect("smoke failure should trigger rollback");
    assert!(!rollback.new_pad_id.is_empty());
}
