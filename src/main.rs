mod cli;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use cli::{Cli, Command};
use sologit::error::EngineError;
use sologit::store::WorkpadFilter;
use sologit::Engine;

/// Map an `EngineError` to the exit codes a CLI wrapper is expected to use
/// (spec.md §6 "Exit codes").
fn exit_code_for(err: &EngineError) -> u8 {
    match err {
        EngineError::RepositoryNotFound { .. }
        | EngineError::WorkpadNotFound { .. }
        | EngineError::AlreadyExists { .. }
        | EngineError::MalformedPatch { .. }
        | EngineError::ImportError { .. } => 2,
        EngineError::CannotPromote { .. }
        | EngineError::PatchConflict { .. }
        | EngineError::InvalidTestPlan { .. }
        | EngineError::DirtyWorkingTree { .. }
        | EngineError::Precondition { .. } => 3,
        EngineError::StoreError { .. } => 4,
        EngineError::GitCommandError { .. } | EngineError::OrchestratorError { .. } => 5,
        EngineError::Cancelled { .. } => 130,
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let state_root = cli.state_root.unwrap_or_else(sologit::store::default_state_root);
    let engine = Engine::open(state_root).context("failed to open state store")?;

    match cli.command {
        Command::InitArchive { archive, name } => {
            let bytes = std::fs::read(&archive).with_context(|| format!("reading {}", archive.display()))?;
            let repo_id = engine.init_from_archive(&bytes, &name)?;
            println!("{repo_id}");
        }
        Command::InitUrl { url, name } => {
            let repo_id = engine.init_from_url(&url, &name)?;
            println!("{repo_id}");
        }
        Command::CreateWorkpad { repo_id, title } => {
            let pad_id = engine.create_workpad(&repo_id, &title)?;
            println!("{pad_id}");
        }
        Command::ListWorkpads { repo_id } => {
            let pads = engine.list_workpads_filtered(WorkpadFilter {
                repo_id,
                ..Default::default()
            })?;
            for pad in pads {
                println!("{}\t{}\t{}\t{}", pad.id, pad.title, pad.status, pad.test_status);
            }
        }
        Command::Apply { pad_id, diff_file, message } => {
            let diff_text = std::fs::read_to_string(&diff_file).with_context(|| format!("reading {}", diff_file.display()))?;
            let commit = engine.apply_commit_on_workpad(&pad_id, &diff_text, &message)?;
            println!("{commit}");
        }
        Command::CanPromote { pad_id } => {
            let (can, reason) = engine.can_promote(&pad_id)?;
            println!("{can}\t{reason}");
        }
        Command::Promote { pad_id } => {
            let commit = engine.promote_workpad(&pad_id)?;
            println!("{commit}");
        }
        Command::Diff { pad_id } => {
            print!("{}", engine.get_diff(&pad_id, None)?);
        }
        Command::RepoMap { repo_id } => {
            for entry in engine.get_repo_map(&repo_id)? {
                println!("{}{}", entry.path.display(), if entry.is_dir { "/" } else { "" });
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "off" })).init();

    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        let code = err.downcast_ref::<EngineError>().map(exit_code_for).unwrap_or(1);
        return ExitCode::from(code);
    }
    ExitCode::SUCCESS
}
