//! Branch-tree builder (C5, §4.5).
//!
//! Reconciles the batch of concrete branch traces a concolic pass
//! collects into a single [`tree::BranchTree`], then thins it down to a
//! solver-sized budget with [`builder::select_and_repair`].

pub mod builder;
pub mod error;
pub mod tree;

pub use builder::{make, reverse, select_and_repair, size};
pub use error::{Result, TreeError};
pub use tree::{branch_seq, BranchCondition, BranchSeq, BranchTree, DistanceSign};
