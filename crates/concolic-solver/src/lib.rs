//! Solver (C6, §4.6).
//!
//! Walks a reconciled [`concolic_tree::BranchTree`], dispatching on each
//! node's shape and each condition's algebraic kind to produce concrete
//! candidate seeds: direct byte assignments for linear equations, a
//! binary search for monotonic brackets, and complementary interval
//! constraints for inequalities. Nothing here spawns a tracer process
//! directly; every probe goes through the [`concolic_tracer::Executor`]
//! facade passed in by the caller.

pub mod cache;
pub mod encode;
pub mod error;
pub mod extract;
pub mod solve;

pub use cache::ChunkSolutionCache;
pub use encode::encode_condition;
pub use error::{Result, SolverError};
pub use extract::{extract_cond, generate_msb_ranges};
pub use solve::{solve, Candidate};
