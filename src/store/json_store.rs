//! Generic atomic JSON state file, shared by the repo and workpad stores.
//!
//! Writes go through write-temp-then-rename so a reader never observes a
//! torn file (spec.md §4.1). A companion `.lock` file gives mutation calls a
//! coarse, process-wide, per-store critical section via `fs2` advisory
//! locking.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Current on-disk schema version. Readers ignore unknown fields on newer
/// minor versions per spec.md §6.
const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope<T> {
    pub v: u32,
    #[serde(default)]
    pub items: BTreeMap<String, T>,
}

impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Self {
            v: SCHEMA_VERSION,
            items: BTreeMap::new(),
        }
    }
}

pub(crate) struct JsonStore<T> {
    path: PathBuf,
    lock_path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub(crate) fn new(path: PathBuf) -> Self {
        let lock_path = path.with_extension("lock");
        Self {
            path,
            lock_path,
            _marker: PhantomData,
        }
    }

    fn store_err(&self, cause: impl std::fmt::Display) -> EngineError {
        EngineError::StoreError {
            path: self.path.clone(),
            cause: cause.to_string(),
        }
    }

    fn lock_file(&self) -> Result<File> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.store_err(e))?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| self.store_err(e))?;
        Ok(file)
    }

    fn read_envelope(&self) -> Result<Envelope<T>> {
        if !self.path.exists() {
            return Ok(Envelope::default());
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| self.store_err(e))?;
        if raw.trim().is_empty() {
            return Ok(Envelope::default());
        }
        serde_json::from_str(&raw).map_err(|e| self.store_err(e))
    }

    /// Read-only snapshot. Readers may run concurrently with each other but
    /// take a shared lock so they never observe a write in progress.
    pub(crate) fn read(&self) -> Result<BTreeMap<String, T>> {
        let lock = self.lock_file()?;
        lock.lock_shared().map_err(|e| self.store_err(e))?;
        let envelope = self.read_envelope();
        FileExt::unlock(&lock).ok();
        Ok(envelope?.items)
    }

    /// Mutate under the store's exclusive lock, writing the result
    /// atomically (temp file + rename). `f` receives the current map and
    /// returns whatever the caller wants to hand back to its own caller.
    pub(crate) fn mutate<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut BTreeMap<String, T>) -> Result<R>,
    {
        let lock = self.lock_file()?;
        lock.lock_exclusive().map_err(|e| self.store_err(e))?;
        let result = (|| {
            let mut envelope = self.read_envelope()?;
            let r = f(&mut envelope.items)?;
            self.write_envelope(&envelope)?;
            Ok(r)
        })();
        FileExt::unlock(&lock).ok();
        result
    }

    fn write_envelope(&self, envelope: &Envelope<T>) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| self.store_err("state path has no parent directory"))?;
        fs::create_dir_all(parent).map_err(|e| self.store_err(e))?;

        let tmp_path = parent.join(format!(
            ".{}.tmp",
            self.path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("state")
        ));
        let json = serde_json::to_vec_pretty(envelope).map_err(|e| self.store_err(e))?;
        {
            let mut tmp = File::create(&tmp_path).map_err(|e| self.store_err(e))?;
            tmp.write_all(&json).map_err(|e| self.store_err(e))?;
            tmp.sync_all().map_err(|e| self.store_err(e))?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|e| self.store_err(e))?;
        Ok(())
    }
}

pub(crate) fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| EngineError::StoreError {
        path: path.to_path_buf(),
        cause: e.to_string(),
    })
}
