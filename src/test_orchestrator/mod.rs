//! Test Orchestrator (spec.md §4.4): runs a batch of `TestConfig`s against a
//! workpad's working tree, sequentially or in a bounded-parallelism pool,
//! and aggregates `TestResult`s. Individual test failures are data, not
//! errors; only plan-level or sandbox-setup problems surface as `Err`.

mod config;
mod events;
mod result;
mod sandbox;
mod scheduler;

pub use config::TestConfig;
pub use events::TestEvent;
pub use result::{OverallColor, TestBatchSummary, TestResult, TestStatus};
pub use scheduler::ScheduleMode;

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Receiver;

use crate::error::Result;

/// Runs `plan` to completion and returns the aggregated summary.
pub fn run(plan: &[TestConfig], workdir: &Path, mode: ScheduleMode, cancel: Arc<AtomicBool>) -> Result<TestBatchSummary> {
    scheduler::run(plan, workdir, mode, cancel, None)
}

/// Runs `plan` on a background thread, returning a channel of `TestEvent`s
/// as each test starts and finishes, for callers that want live progress
/// instead of waiting for the whole batch (spec.md §11).
pub fn run_streaming(plan: Vec<TestConfig>, workdir: std::path::PathBuf, mode: ScheduleMode, cancel: Arc<AtomicBool>) -> Receiver<TestEvent> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        let _ = scheduler::run(&plan, &workdir, mode, cancel, Some(tx));
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn cfg(name: &str, command: &[&str], deps: &[&str]) -> TestConfig {
        TestConfig {
            name: name.to_string(),
            command: command.iter().map(|s| s.to_string()).collect(),
            timeout_seconds: 10,
            depends_on: deps.iter().map(|s| s.to_string()).collect(),
            env: HashMap::new(),
            cwd: None,
        }
    }

    #[test]
    fn sequential_all_pass() {
        let dir = TempDir::new().unwrap();
        let plan = vec![cfg("a", &["true"], &[]), cfg("b", &["true"], &["a"])];
        let summary = run(&plan, dir.path(), ScheduleMode::Sequential, Arc::new(AtomicBool::new(false))).unwrap();
        assert!(summary.all_passed);
        assert_eq!(summary.results.len(), 2);
    }

    #[test]
    fn dependent_skipped_when_dependency_fails() {
        let dir = TempDir::new().unwrap();
        let plan = vec![cfg("a", &["false"], &[]), cfg("b", &["true"], &["a"])];
        let summary = run(&plan, dir.path(), ScheduleMode::Sequential, Arc::new(AtomicBool::new(false))).unwrap();
        assert!(!summary.all_passed);
        let b = summary.results.iter().find(|r| r.name == "b").unwrap();
        assert_eq!(b.status, TestStatus::Skipped);
    }

    #[test]
    fn timeout_marks_test_timeout() {
        let dir = TempDir::new().unwrap();
        let mut test = cfg("slow", &["sleep", "5"], &[]);
        test.timeout_seconds = 1;
        let summary = run(&[test], dir.path(), ScheduleMode::Sequential, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(summary.results[0].status, TestStatus::Timeout);
        assert_eq!(summary.results[0].exit_code, None);
        assert!(summary.results[0].duration_ms < 3000);
    }

    #[test]
    fn parallel_runs_independent_tests() {
        let dir = TempDir::new().unwrap();
        let plan = vec![cfg("a", &["true"], &[]), cfg("b", &["true"], &[]), cfg("c", &["true"], &["a", "b"])];
        let summary = run(
            &plan,
            dir.path(),
            ScheduleMode::Parallel { workers: Some(2) },
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();
        assert!(summary.all_passed);
        assert_eq!(summary.results.len(), 3);
    }
}
