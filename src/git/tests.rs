//! Integration-style tests exercising the real `git` binary inside a
//! `TempDir`.

use tempfile::TempDir;

use super::repo::GitRepo;

fn init_repo() -> (TempDir, GitRepo) {
    let dir = TempDir::new().unwrap();
    let repo = GitRepo::at(dir.path());
    repo.init("main").unwrap();
    std::fs::write(dir.path().join("a.txt"), "one\n").unwrap();
    repo.commit_all("initial", "Test <test@example.com>").unwrap();
    (dir, repo)
}

#[test]
fn branch_create_and_checkout() {
    let (_dir, repo) = init_repo();
    let trunk_tip = repo.rev_parse("HEAD").unwrap();
    repo.create_branch_at("workpad/p1", &trunk_tip).unwrap();
    assert!(repo.branch_exists("workpad/p1").unwrap());
    repo.checkout("workpad/p1").unwrap();
    assert_eq!(repo.current_branch().unwrap().as_deref(), Some("workpad/p1"));
}

#[test]
fn fast_forward_eligible_after_one_commit_ahead() {
    let (dir, repo) = init_repo();
    let trunk_tip = repo.rev_parse("HEAD").unwrap();
    repo.create_branch_at("workpad/p1", &trunk_tip).unwrap();
    repo.checkout("workpad/p1").unwrap();
    std::fs::write(dir.path().join("b.txt"), "two\n").unwrap();
    let pad_tip = repo.commit_all("add b", "Test <test@example.com>").unwrap();

    let (can, reason) = repo.can_promote(&pad_tip, &trunk_tip).unwrap();
    assert!(can);
    assert_eq!(reason, "fast_forward_eligible");
}

#[test]
fn diverged_trunk_is_not_fast_forward() {
    let (dir, repo) = init_repo();
    let trunk_tip = repo.rev_parse("HEAD").unwrap();
    repo.create_branch_at("workpad/p2", &trunk_tip).unwrap();

    // Advance trunk independently of the workpad.
    repo.checkout("main").unwrap();
    std::fs::write(dir.path().join("c.txt"), "three\n").unwrap();
    repo.commit_all("advance trunk", "Test <test@example.com>").unwrap();

    repo.checkout("workpad/p2").unwrap();
    std::fs::write(dir.path().join("d.txt"), "four\n").unwrap();
    let pad_tip = repo.commit_all("pad change", "Test <test@example.com>").unwrap();

    let new_trunk_tip = {
        repo.checkout("main").unwrap();
        repo.rev_parse("HEAD").unwrap()
    };
    let (can, reason) = repo.can_promote(&pad_tip, &new_trunk_tip).unwrap();
    assert!(!can);
    assert_eq!(reason, "not_fast_forward");
}

#[test]
fn promote_fast_forwards_trunk() {
    let (dir, repo) = init_repo();
    let trunk_tip = repo.rev_parse("HEAD").unwrap();
    repo.create_branch_at("workpad/p3", &trunk_tip).unwrap();
    repo.checkout("workpad/p3").unwrap();
    std::fs::write(dir.path().join("e.txt"), "five\n").unwrap();
    let pad_tip = repo.commit_all("pad change", "Test <test@example.com>").unwrap();

    repo.checkout("main").unwrap();
    let merged = repo.merge_ff_only("workpad/p3").unwrap();
    assert_eq!(merged, pad_tip);
}

#[test]
fn revert_inverts_trunk_tip() {
    let (dir, repo) = init_repo();
    let before = repo.rev_parse("HEAD").unwrap();
    std::fs::write(dir.path().join("f.txt"), "six\n").unwrap();
    let after = repo.commit_all("add f", "Test <test@example.com>").unwrap();
    assert_ne!(before, after);

    let reverted = repo.revert_commit(&after).unwrap();
    assert_ne!(reverted, after);
    assert!(!dir.path().join("f.txt").exists());
}

#[test]
fn repo_map_excludes_git_dir() {
    let (dir, _repo) = init_repo();
    let entries = super::walk_repo_map(dir.path()).unwrap();
    assert!(entries.iter().any(|e| e.path == std::path::PathBuf::from("a.txt")));
    assert!(!entries.iter().any(|e| e.path.starts_with(".git")));
}
