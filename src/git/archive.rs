//! `init_from_archive` (spec.md §4.2): extract an archive into a fresh repo
//! directory, `git init`, and make the initial trunk commit if none exists.

use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;

use super::repo::GitRepo;
use crate::error::{EngineError, Result};

/// Extract `bytes` (a `.tar` or gzip-compressed `.tar.gz`) into `dest`,
/// `git init` it with `trunk` as the initial branch, and make the first
/// commit. Fails with `ImportError` on malformed archives.
pub fn init_from_archive(bytes: &[u8], dest: &Path, trunk: &str) -> Result<GitRepo> {
    std::fs::create_dir_all(dest).map_err(|e| EngineError::StoreError {
        path: dest.to_path_buf(),
        cause: e.to_string(),
    })?;

    let is_gzip = bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b;
    let mut archive = if is_gzip {
        tar::Archive::new(Box::new(GzDecoder::new(bytes)) as Box<dyn Read>)
    } else {
        tar::Archive::new(Box::new(bytes) as Box<dyn Read>)
    };

    archive.unpack(dest).map_err(|e| EngineError::ImportError {
        reason: format!("malformed archive: {e}"),
    })?;

    let repo = GitRepo::at(dest);
    repo.init(trunk)?;
    if !repo.has_commits()? {
        repo.initial_commit("Initial import", "sologit <sologit@localhost>")?;
    }
    Ok(repo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
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

    #[test]
    fn extracts_plain_tar_and_commits() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("repo");
        let tar_bytes = make_tar(&[("README.md", "hello")]);
        let repo = init_from_archive(&tar_bytes, &dest, "main").unwrap();
        assert!(dest.join("README.md").exists());
        assert!(repo.has_commits().unwrap());
    }

    #[test]
    fn extracts_gzip_tar() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("repo");
        let tar_bytes = make_tar(&[("a.txt", "x")]);
        let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        gz.write_all(&tar_bytes).unwrap();
        let gz_bytes = gz.finish().unwrap();
        let repo = init_from_archive(&gz_bytes, &dest, "main").unwrap();
        assert!(dest.join("a.txt").exists());
        assert!(repo.has_commits().unwrap());
    }

    #[test]
    fn malformed_archive_is_import_error() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("repo");
        let err = init_from_archive(b"not an archive", &dest, "main").unwrap_err();
        assert!(matches!(err, EngineError::ImportError { .. }));
    }
}
