//! Typed operations on top of the tracer bridge (C9, §4.1).
//!
//! Everything upstream (inference, the solver, the driver) talks to
//! tracers through this trait rather than shelling out directly, so the
//! rest of the engine is agnostic to fork-server vs. per-call spawning
//! and to the wire format.

use concolic_core::{BranchInfo, BranchTrace, CoverageGain, EngineConfig, Seed, Signal};
use num_bigint::BigInt;

use crate::bitmap::CoverageBitmap;
use crate::bridge::{tracer_binary_dir, TracerBridge};
use crate::error::Result;

/// The five operations the rest of the engine needs from a tracer,
/// independent of how it's implemented underneath.
pub trait Executor {
    /// Run `seed` through the coverage tracer and classify the gain
    /// against the running bitmap.
    fn get_coverage(&mut self, seed: &Seed) -> Result<(Signal, CoverageGain)>;

    /// Run `seed` with `try_value` substituted at the cursor through the
    /// branch tracer, returning its full branch trace.
    fn get_branch_trace(
        &mut self,
        seed: &Seed,
        try_value: &BigInt,
    ) -> Result<(Signal, CoverageGain, BranchTrace)>;

    /// Same as [`Executor::get_branch_trace`] but narrowed to the single
    /// record whose `(addr, visit_index)` matches `target`.
    fn get_branch_info(
        &mut self,
        seed: &Seed,
        try_value: &BigInt,
        target: (u64, usize),
    ) -> Result<(Signal, CoverageGain, Option<BranchInfo>)>;

    /// Same as [`Executor::get_branch_info`] but discards signal and
    /// coverage, for callers that only want the one record.
    fn get_branch_info_only(
        &mut self,
        seed: &Seed,
        try_value: &BigInt,
        target: (u64, usize),
    ) -> Result<Option<BranchInfo>>;

    /// Run `seed` through the uninstrumented binary, used to confirm
    /// whether a timeout was actually a crash.
    fn native_execute(&mut self, seed: &Seed) -> Result<Signal>;
}

fn signal_of_status(status: i32) -> Signal {
    Signal::from_raw(status)
}

/// The concrete [`Executor`]: one [`TracerBridge`] per tracer variant,
/// sharing a process-wide [`CoverageBitmap`].
pub struct SubprocessExecutor {
    coverage: TracerBridge,
    branch: TracerBridge,
    bitmap: CoverageBitmap,
}

impl SubprocessExecutor {
    /// The `bbcount` tracer variant is validated to exist alongside the
    /// other two (the CLI's startup check, §4.10) but none of the five
    /// [`Executor`] operations dispatch to it, so no bridge for it is
    /// kept here.
    pub fn new(config: &EngineConfig) -> Result<SubprocessExecutor> {
        let dir = tracer_binary_dir()?;
        Ok(SubprocessExecutor {
            coverage: TracerBridge::new(concolic_core::TracerKind::Coverage, &dir, config)?,
            branch: TracerBridge::new(concolic_core::TracerKind::Branch, &dir, config)?,
            bitmap: CoverageBitmap::new(),
        })
    }
}

impl Executor for SubprocessExecutor {
    fn get_coverage(&mut self, seed: &Seed) -> Result<(Signal, CoverageGain)> {
        let frame = self.coverage.run(seed, &BigInt::from(0), None)?;
        let gain = self.bitmap.update(&frame.output);
        Ok((signal_of_status(frame.status), gain))
    }

    fn get_branch_trace(
        &mut self,
        seed: &Seed,
        try_value: &BigInt,
    ) -> Result<(Signal, CoverageGain, BranchTrace)> {
        let frame = self.branch.run(seed, try_value, None)?;
        let gain = self.bitmap.update(&frame.output);
        Ok((signal_of_status(frame.status), gain, frame.records))
    }

    fn get_branch_info(
        &mut self,
        seed: &Seed,
        try_value: &BigInt,
        target: (u64, usize),
    ) -> Result<(Signal, CoverageGain, Option<BranchInfo>)> {
        let frame = self.branch.run(seed, try_value, Some(target))?;
        let gain = self.bitmap.update(&frame.output);
        let info = frame.records.into_iter().last();
        Ok((signal_of_status(frame.status), gain, info))
    }

    fn get_branch_info_only(
        &mut self,
        seed: &Seed,
        try_value: &BigInt,
        target: (u64, usize),
    ) -> Result<Option<BranchInfo>> {
        let (_, _, info) = self.get_branch_info(seed, try_value, target)?;
        Ok(info)
    }

    fn native_execute(&mut self, seed: &Seed) -> Result<Signal> {
        self.coverage.run_native(seed)
    }
}
