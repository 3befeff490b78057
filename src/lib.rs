//! Workpad / promotion engine for single-developer trunk-based git
//! workflows.
//!
//! A repository's history lives on one append-only `trunk`; work happens on
//! short-lived `workpad` branches that get fast-forwarded onto trunk when
//! their tests pass. The library API is not stable.

pub mod analyzer;
pub mod engine;
pub mod error;
pub mod gate;
pub mod git;
pub mod patch;
pub mod pipeline;
pub mod store;
pub mod test_orchestrator;

pub use engine::Engine;
pub use error::{EngineError, Result};
