//! Argument definitions for the `sg` binary (spec.md §6 "AI orchestrator
//! collaborator" interface exposed directly to a human via this CLI).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sg", version, about = "Workpad / promotion engine for solo trunk-based git workflows", wrap_help = true)]
pub struct Cli {
    /// Override the state root (defaults to SOLOGIT_STATE_ROOT or ~/.sologit).
    #[arg(long, global = true)]
    pub state_root: Option<PathBuf>,

    /// Enable debug logging (same as RUST_LOG=debug).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import a tar/tar.gz archive as a new repository.
    InitArchive { archive: PathBuf, name: String },
    /// Clone a remote URL as a new repository.
    InitUrl { url: String, name: String },
    /// Create a workpad on a repository's trunk tip.
    CreateWorkpad { repo_id: String, title: String },
    /// List workpads, optionally filtered by repository.
    ListWorkpads { repo_id: Option<String> },
    /// Apply a unified diff (read from a file) to a workpad as one commit.
    Apply {
        pad_id: String,
        diff_file: PathBuf,
        message: String,
    },
    /// Show whether a workpad is eligible to fast-forward onto trunk.
    CanPromote { pad_id: String },
    /// Fast-forward trunk onto a workpad and mark it promoted.
    Promote { pad_id: String },
    /// Show the unified diff between trunk and a workpad.
    Diff { pad_id: String },
    /// Show the filtered file listing of a repository's working tree.
    RepoMap { repo_id: String },
}
