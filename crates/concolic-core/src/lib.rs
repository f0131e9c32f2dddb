//! Core data model for the gray-box concolic engine.
//!
//! This crate defines the foundational types shared by every other crate
//! in the workspace: tagged byte values, seeds, branch records, and the
//! interval/constraint algebra used to propagate path conditions. It
//! contains no tracer I/O, no inference, and no solving — only types and
//! the small set of pure operations the data model itself owns.

pub mod bigint;
pub mod branch;
pub mod byte_val;
pub mod config;
pub mod error;
pub mod interval;
pub mod seed;
pub mod typedef;

pub use branch::{BranchInfo, BranchPoint, BranchTrace, CompareType, Context};
pub use byte_val::ByteVal;
pub use config::EngineConfig;
pub use error::{CoreError, Result};
pub use interval::{byte_constraint, constraint, ByteConstraint, Constraint, Interval};
pub use seed::Seed;
pub use typedef::{Arch, CoverageGain, Direction, Endian, InputSource, Priority, Sign, Signal, Signedness, TracerKind};
