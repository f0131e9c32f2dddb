//! Seed queue & scheduling (C8, §4.8): the priority FIFOs that decide
//! which candidate the driver explores next, the on-disk persistence of
//! accepted candidates, the wall-clock time budget, and the process-wide
//! statistics the CLI reports periodically.

mod artifact;
mod corpus;
mod error;
mod queue;
mod scheduler;
mod stats;

pub use artifact::ArtifactStore;
pub use corpus::load_initial_corpus;
pub use error::{QueueError, Result};
pub use queue::{ConcolicQueue, QueueItem};
pub use scheduler::TimeBudget;
pub use stats::Stats;
