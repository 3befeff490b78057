//! Per-test sandboxed subprocess execution (spec.md §4.4 "Per-test
//! lifecycle"): own process group, bounded stdio capture, timeout-based
//! termination.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use super::config::TestConfig;
use super::result::{TestResult, TestStatus};

/// Streams are capped at this many bytes; anything beyond is dropped and a
/// truncation marker is appended, not treated as an error (spec.md §4.4).
const MAX_STREAM_BYTES: usize = 1024 * 1024;
const GRACE_PERIOD: Duration = Duration::from_millis(500);

fn capture_bounded(mut reader: impl Read) -> String {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 8192];
    let mut truncated = false;
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                if buf.len() + n > MAX_STREAM_BYTES {
                    let remaining = MAX_STREAM_BYTES.saturating_sub(buf.len());
                    buf.extend_from_slice(&chunk[..remaining]);
                    truncated = true;
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            Err(_) => break,
        }
    }
    let mut text = String::from_utf8_lossy(&buf).into_owned();
    if truncated {
        text.push_str("\n... [output truncated at 1 MiB]");
    }
    text
}

#[cfg(unix)]
fn new_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    // `process_group(0)` makes the child the leader of its own new group
    // (pgid = its own pid) without requiring a pre_exec hook.
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn new_process_group(_cmd: &mut Command) {}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;
    let pgid = Pid::from_raw(pid as i32);
    let _ = signal::killpg(pgid, Signal::SIGTERM);
}

#[cfg(unix)]
fn force_kill_process_group(pid: u32) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;
    let pgid = Pid::from_raw(pid as i32);
    let _ = signal::killpg(pgid, Signal::SIGKILL);
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}
#[cfg(not(unix))]
fn force_kill_process_group(_pid: u32) {}

/// Run one `TestConfig` to completion (or timeout/cancellation). Never
/// returns an `Err` for test-level failure — per spec.md §4.4 "individual
/// test failures are data, not errors" — reserving an `Err` for a spawn
/// failure that prevents the sandbox from even starting.
pub fn run_one(
    test: &TestConfig,
    workdir: &std::path::Path,
    cancel: &std::sync::atomic::AtomicBool,
) -> crate::error::Result<TestResult> {
    let started_at = chrono::Utc::now();
    let t0 = Instant::now();

    let cwd = test
        .cwd
        .as_ref()
        .map(|c| workdir.join(c))
        .unwrap_or_else(|| workdir.to_path_buf());

    let mut cmd = Command::new(&test.command[0]);
    cmd.args(&test.command[1..])
        .current_dir(&cwd)
        .envs(&test.env)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null());
    new_process_group(&mut cmd);

    let mut child = cmd.spawn().map_err(|e| crate::error::EngineError::OrchestratorError {
        cause: format!("failed to spawn test '{}': {e}", test.name),
    })?;
    let pid = child.id();

    let timeout = Duration::from_secs(test.timeout_seconds);
    let mut status = None;
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cancel.load(std::sync::atomic::Ordering::SeqCst) {
            break;
        }
        match child.wait_timeout(Duration::from_millis(100)) {
            Ok(Some(s)) => {
                status = Some(s);
                break;
            }
            Ok(None) => continue,
            Err(_) => break,
        }
    }

    let cancelled = cancel.load(std::sync::atomic::Ordering::SeqCst);
    let timed_out = status.is_none() && !cancelled;

    if status.is_none() {
        kill_process_group(pid);
        match child.wait_timeout(GRACE_PERIOD) {
            Ok(Some(s)) => status = Some(s),
            _ => {
                force_kill_process_group(pid);
                status = child.wait().ok();
            }
        }
    }

    let stdout = child.stdout.take().map(capture_bounded).unwrap_or_default();
    let stderr = child.stderr.take().map(capture_bounded).unwrap_or_default();
    let duration_ms = t0.elapsed().as_millis() as u64;

    let test_status = if cancelled && status.is_none() {
        TestStatus::Error
    } else if timed_out {
        TestStatus::Timeout
    } else {
        match status {
            Some(s) if s.success() => TestStatus::Passed,
            Some(_) => TestStatus::Failed,
            None => TestStatus::Error,
        }
    };

    // A timeout or cancellation reports no exit code (spec.md §8 scenario 5):
    // the process was killed by us, not run to a real exit, so `status`'s
    // signal-derived code would just describe our own SIGTERM/SIGKILL.
    let exit_code = if matches!(test_status, TestStatus::Timeout | TestStatus::Error) {
        None
    } else {
        status.and_then(|s| {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                s.code().or_else(|| s.signal().map(|sig| 128 + sig))
            }
            #[cfg(not(unix))]
            {
                s.code()
            }
        })
    };

    Ok(TestResult {
        name: test.name.clone(),
        status: test_status,
        exit_code,
        duration_ms,
        stdout,
        stderr,
        started_at,
    })
}
