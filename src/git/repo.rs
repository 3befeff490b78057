//! Core `GitRepo` wrapper: argv construction, command execution, and the
//! primitive operations (`commit`, `branch`, `checkout`, `revert`, ...) the
//! rest of the git engine builds on.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use crate::error::{EngineError, Result};

/// A git working tree at a fixed filesystem path.
///
/// One value per repository; every operation shells out scoped to `path`.
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `git <args>` in this working tree and return trimmed stdout.
    ///
    /// This is the only way the engine invokes `git` — every argument is
    /// passed as a discrete `Command` arg, never interpolated into a shell
    /// string, so arbitrary branch/file names can't escape into command
    /// injection.
    pub fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.exec(args, None)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run `git <args>`, piping `stdin` to the child (used for `git apply`
    /// and `git commit-tree` style invocations that read patch/tree data).
    pub fn run_with_stdin(&self, args: &[&str], stdin: &[u8]) -> Result<String> {
        let output = self.exec(args, Some(stdin))?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Like `run`, but returns `Ok(false)` instead of erroring when the
    /// command exits non-zero — used for boolean probes (`rev-parse
    /// --verify`, `apply --check`) where failure is an expected outcome,
    /// not a subprocess error.
    pub fn probe(&self, args: &[&str]) -> Result<bool> {
        match self.exec(args, None) {
            Ok(output) => Ok(output.status.success()),
            Err(EngineError::GitCommandError { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Run `git <args>` and return `(exit_success, stdout)` regardless of
    /// exit status — for subcommands like `merge-tree` where a non-zero
    /// exit is a normal, data-carrying outcome rather than a failure, so it
    /// must not be routed through `run`'s success-or-`Err` contract (which
    /// would also discard stdout).
    pub fn run_capturing(&self, args: &[&str]) -> Result<(bool, String)> {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.path);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).stdin(Stdio::null());
        let output = cmd.output().map_err(|e| EngineError::GitCommandError {
            argv: args.iter().map(|a| a.to_string()).collect(),
            stderr: e.to_string(),
            exit_code: None,
        })?;
        Ok((output.status.success(), String::from_utf8_lossy(&output.stdout).to_string()))
    }

    fn exec(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<std::process::Output> {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.path);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() });

        let t0 = Instant::now();
        let mut child = cmd.spawn().map_err(|e| EngineError::GitCommandError {
            argv: args.iter().map(|a| a.to_string()).collect(),
            stderr: e.to_string(),
            exit_code: None,
        })?;

        if let Some(data) = stdin {
            use std::io::Write;
            if let Some(mut pipe) = child.stdin.take() {
                let _ = pipe.write_all(data);
            }
        }

        let output = child.wait_with_output().map_err(|e| EngineError::GitCommandError {
            argv: args.iter().map(|a| a.to_string()).collect(),
            stderr: e.to_string(),
            exit_code: None,
        })?;
        let duration_ms = t0.elapsed().as_secs_f64() * 1000.0;
        log::debug!(
            "[sg-trace] repo={} cmd=\"git {}\" dur={:.1}ms ok={}",
            self.path.display(),
            args.join(" "),
            duration_ms,
            output.status.success()
        );

        if !output.status.success() {
            return Err(EngineError::GitCommandError {
                argv: args.iter().map(|a| a.to_string()).collect(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                exit_code: output.status.code(),
            });
        }
        Ok(output)
    }

    // -------------------------------------------------------------- basics

    pub fn init(&self, initial_branch: &str) -> Result<()> {
        std::fs::create_dir_all(&self.path).map_err(|e| EngineError::StoreError {
            path: self.path.clone(),
            cause: e.to_string(),
        })?;
        self.run(&["init", "--quiet", "-b", initial_branch])?;
        Ok(())
    }

    pub fn clone_from(url: &str, dest: &Path) -> Result<Self> {
        let parent = dest.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| EngineError::StoreError {
            path: parent.to_path_buf(),
            cause: e.to_string(),
        })?;
        let dest_str = dest.to_string_lossy().to_string();
        let probe = GitRepo::at(parent);
        probe
            .exec(&["clone", "--quiet", url, &dest_str], None)
            .map_err(|e| match e {
                EngineError::GitCommandError { stderr, .. } => EngineError::ImportError {
                    reason: stderr.trim().to_string(),
                },
                other => other,
            })?;
        Ok(GitRepo::at(dest))
    }

    pub fn has_commits(&self) -> Result<bool> {
        Ok(self.probe(&["rev-parse", "--verify", "--quiet", "HEAD"])?)
    }

    pub fn current_branch(&self) -> Result<Option<String>> {
        let name = self.run(&["symbolic-ref", "--short", "-q", "HEAD"]);
        match name {
            Ok(branch) if !branch.is_empty() => Ok(Some(branch)),
            _ => Ok(None),
        }
    }

    pub fn rev_parse(&self, rev: &str) -> Result<String> {
        self.run(&["rev-parse", rev])
    }

    pub fn branch_exists(&self, branch: &str) -> Result<bool> {
        self.probe(&["rev-parse", "--verify", "--quiet", &format!("refs/heads/{branch}")])
    }

    pub fn create_branch_at(&self, branch: &str, start_point: &str) -> Result<()> {
        self.run(&["branch", branch, start_point])?;
        Ok(())
    }

    pub fn delete_branch(&self, branch: &str, force: bool) -> Result<()> {
        let flag = if force { "-D" } else { "-d" };
        self.run(&["branch", flag, branch])?;
        Ok(())
    }

    pub fn checkout(&self, branch: &str) -> Result<()> {
        self.run(&["checkout", "--quiet", branch])?;
        Ok(())
    }

    pub fn is_dirty(&self) -> Result<bool> {
        let status = self.run(&["status", "--porcelain"])?;
        Ok(!status.is_empty())
    }

    /// `a` is an ancestor of (or equal to) `b`.
    pub fn is_ancestor(&self, a: &str, b: &str) -> Result<bool> {
        self.probe(&["merge-base", "--is-ancestor", a, b])
    }

    pub fn commit_count_between(&self, base: &str, head: &str) -> Result<usize> {
        let out = self.run(&["rev-list", "--count", &format!("{base}..{head}")])?;
        out.parse().map_err(|_| EngineError::GitCommandError {
            argv: vec!["rev-list".into(), "--count".into()],
            stderr: format!("non-numeric rev-list count: {out}"),
            exit_code: None,
        })
    }

    /// Commit everything currently staged/unstaged in the working tree as a
    /// single commit. Used by the patch engine after `git apply`.
    pub fn commit_all(&self, message: &str, author: &str) -> Result<String> {
        self.run(&["add", "-A"])?;
        self.run(&[
            "commit",
            "--quiet",
            "--allow-empty",
            "--author",
            author,
            "-m",
            message,
        ])?;
        self.rev_parse("HEAD")
    }

    /// First `git init`-style commit for a freshly imported repo with no
    /// history yet.
    pub fn initial_commit(&self, message: &str, author: &str) -> Result<String> {
        self.commit_all(message, author)
    }

    /// Invert the tip commit on the current branch with a new commit
    /// (`git revert --no-edit`), keeping history append-only.
    pub fn revert_commit(&self, commit: &str) -> Result<String> {
        self.run(&["revert", "--no-edit", "--quiet", commit])
            .map_err(classify_revert_error)?;
        self.rev_parse("HEAD")
    }

    /// Fast-forward-only merge of `branch` into the current branch.
    pub fn merge_ff_only(&self, branch: &str) -> Result<String> {
        self.run(&["merge", "--ff-only", "--quiet", branch])
            .map_err(classify_merge_error)?;
        self.rev_parse("HEAD")
    }

    pub fn files_changed_in_tree(&self, root: &Path) -> Result<Vec<String>> {
        let out = self.run(&["ls-tree", "-r", "--name-only", "HEAD"]);
        match out {
            Ok(listing) => Ok(listing.lines().map(String::from).collect()),
            Err(_) => {
                let _ = root;
                Ok(Vec::new())
            }
        }
    }
}

/// Classify a failed `git merge --ff-only` into a `CannotPromote`-flavored
/// error when the stderr sentinel indicates a non-fast-forward situation.
fn classify_merge_error(err: EngineError) -> EngineError {
    match err {
        EngineError::GitCommandError { stderr, .. } if stderr.contains("Not possible to fast-forward") => {
            EngineError::CannotPromote {
                pad_id: String::new(),
                reason: "not_fast_forward".to_string(),
            }
        }
        other => other,
    }
}

fn classify_revert_error(err: EngineError) -> EngineError {
    match err {
        EngineError::GitCommandError { stderr, .. } if stderr.to_lowercase().contains("conflict") => {
            EngineError::PatchConflict { files: Vec::new() }
        }
        other => other,
    }
}
