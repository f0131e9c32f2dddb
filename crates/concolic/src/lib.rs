//! `concolic`: a gray-box concolic-execution engine for fuzzing.
//!
//! This is the umbrella crate tying together the engine's pieces: the
//! shared data model ([`core`]), numeric inference over branch-info
//! samples ([`infer`]), the branch-tree builder ([`tree`]), the solver
//! that walks that tree to produce candidate seeds ([`solver`]), the
//! tracer bridge and executor facade ([`tracer`]), the driver that ties
//! sampling/tree-building/solving into one pass ([`driver`]), and the
//! on-disk seed queue ([`queue`]). Application code (the CLI, or any
//! other fuzz-loop driver) should depend on this crate and the
//! [`prelude`] rather than reaching into the individual sub-crates.

pub use concolic_core as core;
pub use concolic_driver as driver;
pub use concolic_infer as infer;
pub use concolic_queue as queue;
pub use concolic_solver as solver;
pub use concolic_tracer as tracer;
pub use concolic_tree as tree;

/// Convenience re-exports for application code driving a fuzz loop.
pub mod prelude {
    pub use crate::core::{
        BranchInfo, BranchPoint, BranchTrace, ByteVal, CompareType, Context, CoreError,
        CoverageGain, Direction, Endian, EngineConfig, InputSource, Priority, Seed, Sign, Signal,
        Signedness, TracerKind,
    };
    pub use crate::driver::run as run_concolic_pass;
    pub use crate::queue::{ArtifactStore, ConcolicQueue, QueueItem, Stats, TimeBudget};
    pub use crate::solver::{solve, Candidate, ChunkSolutionCache};
    pub use crate::tracer::{Executor, SubprocessExecutor, TracerBridge};
    pub use crate::tree::{make as make_branch_tree, select_and_repair, BranchTree};
}
