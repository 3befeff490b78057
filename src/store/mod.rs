//! Repository & Workpad Store (spec.md §4.1).
//!
//! Persists metadata under a fixed per-process state root
//! (`<root>/state/repos.json`, `<root>/state/workpads.json`,
//! `<root>/state/checkpoints.json`). The git working trees themselves live
//! under `<root>/repos/<repo_id>/` and are owned by the git engine, never
//! duplicated here.

mod id;
mod json_store;
mod repository;
mod workpad;

pub use id::{next_pad_id, repo_id_from_source};
pub use repository::{NewRepo, RepoRecord};
pub use workpad::{Checkpoint, TestStatus, WorkpadFilter, WorkpadRecord, WorkpadSortKey, WorkpadStatus};

use std::env;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{EngineError, Result};
use json_store::JsonStore;

const STATE_ROOT_ENV: &str = "SOLOGIT_STATE_ROOT";

/// Resolve the state root: `SOLOGIT_STATE_ROOT` if set, else `~/.sologit`.
pub fn default_state_root() -> PathBuf {
    if let Ok(root) = env::var(STATE_ROOT_ENV) {
        return PathBuf::from(root);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sologit")
}

/// Coarse-locked, file-backed metadata store for repositories and workpads.
pub struct Store {
    root: PathBuf,
    repos: JsonStore<RepoRecord>,
    workpads: JsonStore<WorkpadRecord>,
    checkpoints: JsonStore<Checkpoint>,
}

impl Store {
    pub fn open(root: PathBuf) -> Result<Self> {
        json_store::ensure_dir(&root.join("repos"))?;
        let state_dir = root.join("state");
        json_store::ensure_dir(&state_dir)?;
        Ok(Self {
            repos: JsonStore::new(state_dir.join("repos.json")),
            workpads: JsonStore::new(state_dir.join("workpads.json")),
            checkpoints: JsonStore::new(state_dir.join("checkpoints.json")),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path where a repo's git working tree should live.
    pub fn repo_path(&self, repo_id: &str) -> PathBuf {
        self.root.join("repos").join(repo_id)
    }

    // ---------------------------------------------------------------- repos

    pub fn create_repo(&self, id: String, new: NewRepo) -> Result<RepoRecord> {
        self.repos.mutate(|items| {
            if items.contains_key(&id) {
                return Err(EngineError::AlreadyExists { id: id.clone() });
            }
            let record = RepoRecord {
                id: id.clone(),
                name: new.name,
                path: new.path,
                trunk: new.trunk,
                created_at: Utc::now(),
                origin_url: new.origin_url,
            };
            items.insert(id, record.clone());
            Ok(record)
        })
    }

    pub fn get_repo(&self, repo_id: &str) -> Result<RepoRecord> {
        self.repos
            .read()?
            .get(repo_id)
            .cloned()
            .ok_or_else(|| EngineError::RepositoryNotFound {
                repo_id: repo_id.to_string(),
            })
    }

    pub fn list_repos(&self) -> Result<Vec<RepoRecord>> {
        Ok(self.repos.read()?.into_values().collect())
    }

    pub fn update_repo<F>(&self, repo_id: &str, f: F) -> Result<RepoRecord>
    where
        F: FnOnce(&mut RepoRecord),
    {
        self.repos.mutate(|items| {
            let record = items
                .get_mut(repo_id)
                .ok_or_else(|| EngineError::RepositoryNotFound {
                    repo_id: repo_id.to_string(),
                })?;
            f(record);
            Ok(record.clone())
        })
    }

    pub fn delete_repo(&self, repo_id: &str) -> Result<()> {
        self.repos.mutate(|items| {
            items
                .remove(repo_id)
                .ok_or_else(|| EngineError::RepositoryNotFound {
                    repo_id: repo_id.to_string(),
                })?;
            Ok(())
        })
    }

    // -------------------------------------------------------------- workpads

    pub fn create_workpad(&self, id: String, record: WorkpadRecord) -> Result<WorkpadRecord> {
        self.workpads.mutate(|items| {
            if items.contains_key(&id) {
                return Err(EngineError::AlreadyExists { id: id.clone() });
            }
            items.insert(id, record.clone());
            Ok(record)
        })
    }

    pub fn get_workpad(&self, pad_id: &str) -> Result<WorkpadRecord> {
        self.workpads
            .read()?
            .get(pad_id)
            .cloned()
            .ok_or_else(|| EngineError::WorkpadNotFound {
                pad_id: pad_id.to_string(),
            })
    }

    pub fn list_workpads(&self, filter: &WorkpadFilter) -> Result<Vec<WorkpadRecord>> {
        let mut items: Vec<WorkpadRecord> = self
            .workpads
            .read()?
            .into_values()
            .filter(|w| filter.repo_id.as_deref().is_none_or(|r| r == w.repo_id))
            .filter(|w| filter.status.is_none_or(|s| s == w.status))
            .filter(|w| filter.test_status.is_none_or(|s| s == w.test_status))
            .collect();

        if let Some(key) = filter.sort_by {
            items.sort_by(|a, b| match key {
                WorkpadSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                WorkpadSortKey::LastActivityAt => a.last_activity_at.cmp(&b.last_activity_at),
                WorkpadSortKey::Title => a.title.cmp(&b.title),
            });
        }
        if filter.reverse {
            items.reverse();
        }
        Ok(items)
    }

    pub fn update_workpad<F>(&self, pad_id: &str, f: F) -> Result<WorkpadRecord>
    where
        F: FnOnce(&mut WorkpadRecord),
    {
        self.workpads.mutate(|items| {
            let record = items
                .get_mut(pad_id)
                .ok_or_else(|| EngineError::WorkpadNotFound {
                    pad_id: pad_id.to_string(),
                })?;
            f(record);
            Ok(record.clone())
        })
    }

    pub fn delete_workpad(&self, pad_id: &str) -> Result<()> {
        self.workpads.mutate(|items| {
            items
                .remove(pad_id)
                .ok_or_else(|| EngineError::WorkpadNotFound {
                    pad_id: pad_id.to_string(),
                })?;
            Ok(())
        })
    }

    // ------------------------------------------------------------ checkpoints

    pub fn add_checkpoint(&self, checkpoint: Checkpoint) -> Result<()> {
        self.checkpoints.mutate(|items| {
            items.insert(checkpoint.commit_hash.clone(), checkpoint);
            Ok(())
        })
    }

    pub fn get_checkpoint(&self, commit_hash: &str) -> Result<Option<Checkpoint>> {
        Ok(self.checkpoints.read()?.get(commit_hash).cloned())
    }
}
