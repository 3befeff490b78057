//! The single explicit `Engine` value (spec.md §9, "Global singletons"):
//! wires the store, git engine, patch engine, test orchestrator, analyzer,
//! gate, and pipeline together behind the public contract of spec.md §4.2,
//! §6. No process-wide mutable globals; the state root is injected at
//! construction.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::analyzer::Analysis;
use crate::error::{EngineError, Result};
use crate::gate::{Decision, PromotionRules};
use crate::git::{self, GitRepo, MergePreview, RepoMapEntry};
use crate::patch::{self, PatchPreview};
use crate::pipeline::{self, AutoMergeReport};
use crate::store::{
    self, Checkpoint, NewRepo, RepoRecord, Store, TestStatus as WorkpadTestStatus, WorkpadFilter, WorkpadRecord, WorkpadStatus,
};
use crate::test_orchestrator::{self, ScheduleMode, TestBatchSummary, TestConfig};

const DEFAULT_AUTHOR: &str = "sologit <sologit@localhost>";

#[derive(Debug, Clone, Serialize)]
pub struct CompareResult {
    pub files_changed: usize,
    pub files_details: Vec<String>,
    pub diff: String,
}

/// The top-level engine value. Construct one per process and thread it
/// through every call site — no globals.
pub struct Engine {
    store: Store,
}

impl Engine {
    pub fn open(state_root: PathBuf) -> Result<Self> {
        Ok(Self {
            store: Store::open(state_root)?,
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(store::default_state_root())
    }

    fn repo_git(&self, repo_id: &str) -> Result<(RepoRecord, GitRepo)> {
        let record = self.store.get_repo(repo_id)?;
        let git = GitRepo::at(record.path.clone());
        Ok((record, git))
    }

    fn workpad_and_repo(&self, pad_id: &str) -> Result<(WorkpadRecord, RepoRecord, GitRepo)> {
        let pad = self.store.get_workpad(pad_id)?;
        let (repo, git) = self.repo_git(&pad.repo_id)?;
        Ok((pad, repo, git))
    }

    // ----------------------------------------------------------- import

    pub fn init_from_archive(&self, bytes: &[u8], name: &str) -> Result<String> {
        let repo_id = store::repo_id_from_source(bytes, name);
        let dest = self.store.repo_path(&repo_id);
        let trunk = "main".to_string();
        git::init_from_archive(bytes, &dest, &trunk)?;
        self.store.create_repo(
            repo_id.clone(),
            NewRepo {
                name: name.to_string(),
                path: dest,
                trunk,
                origin_url: None,
            },
        )?;
        Ok(repo_id)
    }

    pub fn init_from_url(&self, url: &str, name: &str) -> Result<String> {
        let repo_id = store::repo_id_from_source(url.as_bytes(), name);
        let dest = self.store.repo_path(&repo_id);
        let repo = GitRepo::clone_from(url, &dest)?;
        let trunk = repo.current_branch()?.ok_or_else(|| EngineError::ImportError {
            reason: "cloned repository has no checked-out branch to use as trunk".to_string(),
        })?;
        self.store.create_repo(
            repo_id.clone(),
            NewRepo {
                name: name.to_string(),
                path: dest,
                trunk,
                origin_url: Some(url.to_string()),
            },
        )?;
        Ok(repo_id)
    }

    // ---------------------------------------------------------- workpads

    pub fn create_workpad(&self, repo_id: &str, title: &str) -> Result<String> {
        let repo = self.store.get_repo(repo_id)?;
        let git = GitRepo::at(&repo.path);
        if !git.has_commits()? {
            return Err(EngineError::Precondition {
                reason: format!("repository '{repo_id}' has no commits yet"),
            });
        }
        let trunk_tip = git.rev_parse(&repo.trunk)?;
        let pad_id = store::next_pad_id(repo_id, title);
        let branch = format!("workpad/{pad_id}");
        git.create_branch_at(&branch, &trunk_tip)?;

        let now = Utc::now();
        self.store.create_workpad(
            pad_id.clone(),
            WorkpadRecord {
                id: pad_id.clone(),
                repo_id: repo_id.to_string(),
                title: title.to_string(),
                branch,
                status: WorkpadStatus::Active,
                test_status: WorkpadTestStatus::Unknown,
                created_at: now,
                last_activity_at: now,
                checkpoints: Vec::new(),
            },
        )?;
        Ok(pad_id)
    }

    pub fn list_workpads_filtered(&self, filter: WorkpadFilter) -> Result<Vec<WorkpadRecord>> {
        self.store.list_workpads(&filter)
    }

    pub fn get_active_workpad(&self, repo_id: &str) -> Result<Option<WorkpadRecord>> {
        let repo = self.store.get_repo(repo_id)?;
        let git = GitRepo::at(&repo.path);
        let Some(branch) = git.current_branch()? else {
            return Ok(None);
        };
        if branch == repo.trunk {
            return Ok(None);
        }
        let pads = self.store.list_workpads(&WorkpadFilter {
            repo_id: Some(repo_id.to_string()),
            ..Default::default()
        })?;
        Ok(pads.into_iter().find(|p| p.branch == branch))
    }

    pub fn switch_workpad(&self, pad_id: &str) -> Result<()> {
        let (pad, _repo, git) = self.workpad_and_repo(pad_id)?;
        if !pad.is_active() {
            return Err(EngineError::Precondition {
                reason: format!("workpad '{pad_id}' is not active"),
            });
        }
        git.checkout(&pad.branch)?;
        self.store.update_workpad(pad_id, |w| w.last_activity_at = Utc::now())?;
        Ok(())
    }

    pub fn cleanup_workpads(&self, repo_id: Option<&str>, days: i64, status: Option<WorkpadStatus>) -> Result<Vec<String>> {
        let filter = WorkpadFilter {
            repo_id: repo_id.map(str::to_string),
            status,
            ..Default::default()
        };
        let cutoff = Utc::now() - chrono::Duration::days(days);
        let candidates: Vec<WorkpadRecord> = self
            .store
            .list_workpads(&filter)?
            .into_iter()
            .filter(|w| w.last_activity_at < cutoff)
            .collect();

        let mut deleted = Vec::new();
        for pad in candidates {
            let (_repo, git) = self.repo_git(&pad.repo_id)?;
            let _ = git.delete_branch(&pad.branch, true);
            self.store.delete_workpad(&pad.id)?;
            deleted.push(pad.id);
        }
        Ok(deleted)
    }

    // -------------------------------------------------------------- patch

    pub fn apply_commit_on_workpad(&self, pad_id: &str, diff_text: &str, message: &str) -> Result<String> {
        let (pad, _repo, git) = self.workpad_and_repo(pad_id)?;
        git.checkout(&pad.branch)?;
        let parent = git.rev_parse("HEAD")?;
        let commit = patch::apply(&git, diff_text, message, DEFAULT_AUTHOR, true)?;

        let parsed = patch::parse_patch(diff_text)?;
        let files: Vec<String> = parsed.files.iter().map(|f| f.path().to_string()).collect();

        self.store.add_checkpoint(Checkpoint {
            commit_hash: commit.clone(),
            message: message.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            timestamp: Utc::now(),
            files,
            parent: Some(parent),
        })?;
        self.store.update_workpad(pad_id, |w| {
            w.checkpoints.push(commit.clone());
            w.last_activity_at = Utc::now();
        })?;
        Ok(commit)
    }

    pub fn preview_patch(&self, pad_id: &str, diff_text: &str) -> Result<PatchPreview> {
        let (pad, _repo, git) = self.workpad_and_repo(pad_id)?;
        git.checkout(&pad.branch)?;
        patch::preview(&git, diff_text)
    }

    // ------------------------------------------------------------ promote

    pub fn can_promote(&self, pad_id: &str) -> Result<(bool, String)> {
        let (pad, repo, git) = self.workpad_and_repo(pad_id)?;
        let pad_tip = git.rev_parse(&pad.branch)?;
        let trunk_tip = git.rev_parse(&repo.trunk)?;
        git.can_promote(&pad_tip, &trunk_tip)
    }

    pub fn promote_workpad(&self, pad_id: &str) -> Result<String> {
        let (pad, repo, git) = self.workpad_and_repo(pad_id)?;
        if !pad.is_active() {
            return Err(EngineError::CannotPromote {
                pad_id: pad_id.to_string(),
                reason: "workpad is not active".to_string(),
            });
        }
        let pad_tip = git.rev_parse(&pad.branch)?;
        let trunk_tip = git.rev_parse(&repo.trunk)?;
        let (can, reason) = git.can_promote(&pad_tip, &trunk_tip)?;
        if !can {
            return Err(EngineError::CannotPromote {
                pad_id: pad_id.to_string(),
                reason,
            });
        }
        git.checkout(&repo.trunk)?;
        let commit = git.merge_ff_only(&pad.branch)?;
        self.store.update_workpad(pad_id, |w| w.status = WorkpadStatus::Promoted)?;
        Ok(commit)
    }

    pub fn revert_last_commit(&self, repo_id: &str) -> Result<String> {
        let (repo, git) = self.repo_git(repo_id)?;
        git.checkout(&repo.trunk)?;
        let tip = git.rev_parse(&repo.trunk)?;
        git.revert_commit(&tip)
    }

    // ----------------------------------------------------------- read-only

    pub fn get_diff(&self, pad_id: &str, base: Option<&str>) -> Result<String> {
        let (pad, repo, git) = self.workpad_and_repo(pad_id)?;
        let base = match base {
            Some(b) => b.to_string(),
            None => git.rev_parse(&repo.trunk)?,
        };
        let head = git.rev_parse(&pad.branch)?;
        git.diff_text(&base, &head)
    }

    pub fn get_repo_map(&self, repo_id: &str) -> Result<Vec<RepoMapEntry>> {
        let repo = self.store.get_repo(repo_id)?;
        git::walk_repo_map(&repo.path)
    }

    pub fn get_file_contents(&self, pad_id: &str, paths: &[String]) -> Result<HashMap<String, String>> {
        let (_pad, repo, _git) = self.workpad_and_repo(pad_id)?;
        let mut out = HashMap::with_capacity(paths.len());
        for path in paths {
            let full = repo.path.join(path);
            let contents = std::fs::read_to_string(&full).map_err(|e| EngineError::StoreError {
                path: full,
                cause: e.to_string(),
            })?;
            out.insert(path.clone(), contents);
        }
        Ok(out)
    }

    pub fn compare_workpads(&self, pad_id_a: &str, pad_id_b: &str) -> Result<CompareResult> {
        let (pad_a, repo_a, git) = self.workpad_and_repo(pad_id_a)?;
        let pad_b = self.store.get_workpad(pad_id_b)?;
        if pad_b.repo_id != repo_a.id {
            return Err(EngineError::Precondition {
                reason: "cannot compare workpads from different repositories".to_string(),
            });
        }
        let tip_a = git.rev_parse(&pad_a.branch)?;
        let tip_b = git.rev_parse(&pad_b.branch)?;
        let stats = git.diff_stats(&tip_a, &tip_b)?;
        let diff = git.diff_text(&tip_a, &tip_b)?;
        Ok(CompareResult {
            files_changed: stats.files,
            files_details: stats.files_list,
            diff,
        })
    }

    pub fn get_workpad_merge_preview(&self, pad_id: &str) -> Result<MergePreview> {
        let (pad, repo, git) = self.workpad_and_repo(pad_id)?;
        let pad_tip = git.rev_parse(&pad.branch)?;
        let trunk_tip = git.rev_parse(&repo.trunk)?;
        git.merge_preview(&pad_tip, &trunk_tip)
    }

    // ------------------------------------------------------------- tests

    pub fn run_tests(&self, pad_id: &str, plan: &[TestConfig], mode: ScheduleMode, cancel: Arc<AtomicBool>) -> Result<TestBatchSummary> {
        let (pad, _repo, git) = self.workpad_and_repo(pad_id)?;
        git.checkout(&pad.branch)?;
        test_orchestrator::run(plan, git.path(), mode, cancel)
    }

    pub fn analyze(&self, summary: &TestBatchSummary) -> Analysis {
        crate::analyzer::analyze(summary)
    }

    pub fn evaluate_gate(&self, pad_id: &str, rules: &PromotionRules, analysis: Option<&Analysis>) -> Result<Decision> {
        let (pad, _repo, _git) = self.workpad_and_repo(pad_id)?;
        let preview = self.get_workpad_merge_preview(pad_id)?;
        Ok(crate::gate::evaluate(rules, &pad, analysis, &preview))
    }

    // ----------------------------------------------------------- pipeline

    pub fn run_auto_merge(
        &self,
        pad_id: &str,
        test_plan: &[TestConfig],
        mode: ScheduleMode,
        rules: &PromotionRules,
        smoke_plan: Option<&[TestConfig]>,
        cancel: Arc<AtomicBool>,
    ) -> Result<AutoMergeReport> {
        let (pad, repo, git) = self.workpad_and_repo(pad_id)?;
        pipeline::run_auto_merge(&self.store, &git, &pad, &repo.trunk, test_plan, mode, rules, smoke_plan, cancel)
    }
}
