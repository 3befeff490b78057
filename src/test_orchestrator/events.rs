//! Streaming test events, the incremental counterpart to the batch `run`
//! facade (spec.md §11 supplemented behavior: a caller that wants live
//! progress can drain a `crossbeam_channel::Receiver<TestEvent>` instead of
//! waiting for the whole batch).

use super::result::TestResult;

#[derive(Debug, Clone)]
pub enum TestEvent {
    Started { name: String },
    Finished { result: TestResult },
    BatchDone,
}
