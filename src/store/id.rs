//! Short id generation.
//!
//! Repo ids are content-derived (spec.md §3: "short content-derived
//! identifier, stable for the life of the repo") from the import source.
//! Workpad ids only need to be unique within the process, so they are
//! derived from the parent repo id, title, and a monotonic counter, hashed
//! with the same `sha2` digest used for repo ids rather than pulling in a
//! separate random-number crate.

use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};

/// Length, in hex characters, of a short id.
const SHORT_ID_LEN: usize = 8;

static WORKPAD_COUNTER: AtomicU64 = AtomicU64::new(0);

fn short_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    let digest = hasher.finalize();
    digest.iter().take(SHORT_ID_LEN / 2).map(|b| format!("{b:02x}")).collect()
}

/// Derive a repo id from its import source (archive bytes, or a clone URL)
/// plus a name, so re-importing the same source under the same name is
/// stable.
pub fn repo_id_from_source(source: &[u8], name: &str) -> String {
    let mut input = Vec::with_capacity(source.len() + name.len() + 1);
    input.extend_from_slice(name.as_bytes());
    input.push(0);
    input.extend_from_slice(source);
    short_hex(&input)
}

/// Derive a pad id unique within this process.
pub fn next_pad_id(repo_id: &str, title: &str) -> String {
    let n = WORKPAD_COUNTER.fetch_add(1, Ordering::SeqCst);
    let mut input = Vec::new();
    input.extend_from_slice(repo_id.as_bytes());
    input.push(0);
    input.extend_from_slice(title.as_bytes());
    input.push(0);
    input.extend_from_slice(&n.to_le_bytes());
    short_hex(&input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_id_is_stable_for_same_source() {
        let a = repo_id_from_source(b"hello", "acme");
        let b = repo_id_from_source(b"hello", "acme");
        assert_eq!(a, b);
        assert_eq!(a.len(), SHORT_ID_LEN);
    }

    #[test]
    fn repo_id_differs_by_name() {
        let a = repo_id_from_source(b"hello", "acme");
        let b = repo_id_from_source(b"hello", "other");
        assert_ne!(a, b);
    }

    #[test]
    fn pad_ids_are_unique() {
        let a = next_pad_id("r1", "add login");
        let b = next_pad_id("r1", "add login");
        assert_ne!(a, b);
    }
}
