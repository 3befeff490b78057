//! Sequential and parallel scheduling over a validated test plan (spec.md
//! §4.4 "Scheduling model").

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Sender;

use super::config::{topo_order, validate_unique_names, TestConfig};
use super::events::TestEvent;
use super::result::{summarize, TestBatchSummary, TestResult, TestStatus};
use super::sandbox::run_one;
use crate::error::Result;

#[derive(Debug, Clone, Copy)]
pub enum ScheduleMode {
    Sequential,
    Parallel { workers: Option<usize> },
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1).min(8)
}

fn skipped_result(name: &str) -> TestResult {
    TestResult {
        name: name.to_string(),
        status: TestStatus::Skipped,
        exit_code: None,
        duration_ms: 0,
        stdout: String::new(),
        stderr: String::new(),
        started_at: chrono::Utc::now(),
    }
}

/// Run `plan` against `workdir`, emitting a `TestEvent` per state change on
/// `events` (spec.md §11: streaming is an addition on top of the batch
/// facade, not a replacement for it).
pub fn run(
    plan: &[TestConfig],
    workdir: &Path,
    mode: ScheduleMode,
    cancel: Arc<AtomicBool>,
    events: Option<Sender<TestEvent>>,
) -> Result<TestBatchSummary> {
    validate_unique_names(plan)?;
    let order = topo_order(plan)?;

    let t0 = Instant::now();
    let results = match mode {
        ScheduleMode::Sequential => run_sequential(plan, &order, workdir, &cancel, events.as_ref()),
        ScheduleMode::Parallel { workers } => {
            run_parallel(plan, workdir, workers.unwrap_or_else(default_parallelism), cancel.clone(), events.as_ref())
        }
    };
    if let Some(tx) = &events {
        let _ = tx.send(TestEvent::BatchDone);
    }
    Ok(summarize(results, t0.elapsed().as_millis() as u64))
}

fn dependencies_satisfied(test: &TestConfig, statuses: &HashMap<&str, TestStatus>) -> Option<bool> {
    for dep in &test.depends_on {
        match statuses.get(dep.as_str()) {
            None => return None, // dependency hasn't run yet
            Some(TestStatus::Passed) => continue,
            Some(_) => return Some(false),
        }
    }
    Some(true)
}

fn run_sequential(
    plan: &[TestConfig],
    order: &[usize],
    workdir: &Path,
    cancel: &AtomicBool,
    events: Option<&Sender<TestEvent>>,
) -> Vec<TestResult> {
    let mut statuses: HashMap<&str, TestStatus> = HashMap::new();
    let mut results = Vec::with_capacity(plan.len());

    for &i in order {
        let test = &plan[i];
        let ready = dependencies_satisfied(test, &statuses).unwrap_or(true);
        let result = if !ready {
            skipped_result(&test.name)
        } else if cancel.load(std::sync::atomic::Ordering::SeqCst) {
            skipped_result(&test.name)
        } else {
            if let Some(tx) = events {
                let _ = tx.send(TestEvent::Started { name: test.name.clone() });
            }
            run_one(test, workdir, cancel).unwrap_or_else(|e| TestResult {
                name: test.name.clone(),
                status: TestStatus::Error,
                exit_code: None,
                duration_ms: 0,
                stdout: String::new(),
                stderr: e.to_string(),
                started_at: chrono::Utc::now(),
            })
        };
        statuses.insert(&test.name, result.status);
        if let Some(tx) = events {
            let _ = tx.send(TestEvent::Finished { result: result.clone() });
        }
        results.push(result);
    }
    results
}

fn run_parallel(
    plan: &[TestConfig],
    workdir: &Path,
    workers: usize,
    cancel: Arc<AtomicBool>,
    events: Option<&Sender<TestEvent>>,
) -> Vec<TestResult> {
    let workdir: PathBuf = workdir.to_path_buf();
    let n = plan.len();
    let mut in_degree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let index_of: HashMap<&str, usize> = plan.iter().enumerate().map(|(i, t)| (t.name.as_str(), i)).collect();
    for (i, test) in plan.iter().enumerate() {
        in_degree[i] = test.depends_on.len();
        for dep in &test.depends_on {
            dependents[index_of[dep.as_str()]].push(i);
        }
    }

    let mut results: Vec<Option<TestResult>> = (0..n).map(|_| None).collect();
    let mut ready: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut in_flight = 0usize;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .expect("failed to build test worker pool");

    let (tx, rx) = crossbeam_channel::unbounded::<(usize, TestResult)>();

    pool.scope(|scope| {
        loop {
            while in_flight < workers && !ready.is_empty() {
                let i = ready.pop_front().unwrap();
                let test = &plan[i];
                let parent_failed = test.depends_on.iter().any(|d| {
                    !matches!(
                        results[index_of[d.as_str()]].as_ref().map(|r| r.status),
                        Some(TestStatus::Passed)
                    )
                });
                if parent_failed {
                    let r = skipped_result(&test.name);
                    if let Some(evtx) = events {
                        let _ = evtx.send(TestEvent::Finished { result: r.clone() });
                    }
                    results[i] = Some(r);
                    for &dep_idx in &dependents[i] {
                        in_degree[dep_idx] -= 1;
                        if in_degree[dep_idx] == 0 {
                            ready.push_back(dep_idx);
                        }
                    }
                    continue;
                }

                if let Some(evtx) = events {
                    let _ = evtx.send(TestEvent::Started { name: test.name.clone() });
                }
                in_flight += 1;
                let tx = tx.clone();
                let test = test.clone();
                let workdir = workdir.clone();
                let cancel = cancel.clone();
                scope.spawn(move |_| {
                    let result = run_one(&test, &workdir, &cancel).unwrap_or_else(|e| TestResult {
                        name: test.name.clone(),
                        status: TestStatus::Error,
                        exit_code: None,
                        duration_ms: 0,
                        stdout: String::new(),
                        stderr: e.to_string(),
                        started_at: chrono::Utc::now(),
                    });
                    let _ = tx.send((i, result));
                });
            }

            if in_flight == 0 {
                break;
            }
            if let Ok((i, result)) = rx.recv() {
                in_flight -= 1;
                if let Some(evtx) = events {
                    let _ = evtx.send(TestEvent::Finished { result: result.clone() });
                }
                results[i] = Some(result);
                for &dep_idx in &dependents[i] {
                    in_degree[dep_idx] -= 1;
                    if in_degree[dep_idx] == 0 {
                        ready.push_back(dep_idx);
                    }
                }
            }
        }
    });

    results
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.unwrap_or_else(|| skipped_result(&plan[i].name)))
        .collect()
}
