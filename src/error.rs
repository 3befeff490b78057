//! Engine-wide error taxonomy.
//!
//! Every fallible engine operation returns `Result<T, EngineError>`. Variants
//! are plain data (no embedded styling) so CLI/GUI callers can render them
//! however they like; see spec.md §7 for the taxonomy these map onto.

use std::fmt;
use std::path::PathBuf;

/// Discriminated engine error, grouped by kind per spec.md §7.
#[derive(Debug)]
pub enum EngineError {
    /// A referenced repository does not exist in the store.
    RepositoryNotFound { repo_id: String },
    /// A create call collided with an existing id.
    AlreadyExists { id: String },
    /// A referenced workpad does not exist in the store.
    WorkpadNotFound { pad_id: String },
    /// Promotion is not currently legal for this workpad.
    CannotPromote { pad_id: String, reason: String },
    /// A patch could not be applied without a conflict.
    PatchConflict { files: Vec<String> },
    /// A submitted test plan is invalid (cycle, unknown dependency, bad timeout).
    InvalidTestPlan { reason: String },
    /// The working tree has changes the caller did not account for.
    DirtyWorkingTree { path: PathBuf },
    /// A precondition other than the more specific variants above was not
    /// met (e.g. creating a workpad on a repo with no commits yet).
    Precondition { reason: String },
    /// A unified diff could not be parsed.
    MalformedPatch { line: usize, hint: String },
    /// An archive could not be imported.
    ImportError { reason: String },
    /// A `git` subprocess exited unsuccessfully or failed to spawn.
    GitCommandError {
        argv: Vec<String>,
        stderr: String,
        exit_code: Option<i32>,
    },
    /// The persisted store could not be read or written.
    StoreError { path: PathBuf, cause: String },
    /// The operation was cancelled before completing.
    Cancelled { partial: bool },
    /// The test orchestrator could not even set up a run (sandbox spawn
    /// failure independent of any individual test's result).
    OrchestratorError { cause: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::RepositoryNotFound { repo_id } => {
                write!(f, "repository not found: {repo_id}")
            }
            EngineError::AlreadyExists { id } => {
                write!(f, "already exists: {id}")
            }
            EngineError::WorkpadNotFound { pad_id } => {
                write!(f, "workpad not found: {pad_id}")
            }
            EngineError::CannotPromote { pad_id, reason } => {
                write!(f, "cannot promote workpad {pad_id}: {reason}")
            }
            EngineError::PatchConflict { files } => {
                write!(f, "patch conflicts in: {}", files.join(", "))
            }
            EngineError::InvalidTestPlan { reason } => {
                write!(f, "invalid test plan: {reason}")
            }
            EngineError::DirtyWorkingTree { path } => {
                write!(f, "working tree has uncommitted changes: {}", path.display())
            }
            EngineError::Precondition { reason } => {
                write!(f, "precondition failed: {reason}")
            }
            EngineError::MalformedPatch { line, hint } => {
                write!(f, "malformed patch at line {line}: {hint}")
            }
            EngineError::ImportError { reason } => {
                write!(f, "import failed: {reason}")
            }
            EngineError::GitCommandError {
                argv,
                stderr,
                exit_code,
            } => {
                write!(
                    f,
                    "git {} failed (exit {:?}): {}",
                    argv.join(" "),
                    exit_code,
                    stderr.trim()
                )
            }
            EngineError::StoreError { path, cause } => {
                write!(f, "store error at {}: {cause}", path.display())
            }
            EngineError::Cancelled { partial } => {
                write!(
                    f,
                    "operation cancelled{}",
                    if *partial { " (partial results returned)" } else { "" }
                )
            }
            EngineError::OrchestratorError { cause } => {
                write!(f, "test orchestrator error: {cause}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

pub type Result<T> = std::result::Result<T, EngineError>;
