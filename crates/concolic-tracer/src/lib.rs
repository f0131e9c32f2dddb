//! Tracer bridge (C1) and executor facade (C9).
//!
//! This crate owns every boundary between the engine and the target
//! program: spawning `qemu-trace-*` children (or the uninstrumented
//! binary, for [`executor::Executor::native_execute`]), speaking the
//! wire protocol of [`wire`], and folding raw coverage counts into the
//! running [`bitmap::CoverageBitmap`]. Nothing upstream of this crate
//! touches a `std::process::Command`.

pub mod bitmap;
pub mod bridge;
pub mod error;
pub mod executor;
pub mod wire;

pub use bridge::{tracer_binary_dir, ForkServerMode, TracerBridge};
pub use error::{ExecutionError, Result};
pub use executor::{Executor, SubprocessExecutor};
pub use wire::{read_frame, write_frame, TraceFrame};
