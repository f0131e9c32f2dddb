//! On-disk artifact persistence (§4.8, §6).
//!
//! `queue/id:NNNNNN` and `crashes/id:NNNNNN` are independent monotonic
//! sequences of six-hex-digit, zero-padded, lower-case filenames holding
//! the concretized bytes of an accepted seed. Classification decides
//! which directories (zero, one, or both) a given candidate lands in.

use std::path::{Path, PathBuf};

use concolic_core::{CoverageGain, Seed, Signal};
use concolic_tracer::Executor;

use crate::error::{QueueError, Result};
use crate::stats::Stats;

const QUEUE_DIR: &str = "queue";
const CRASHES_DIR: &str = "crashes";

fn artifact_name(index: u64) -> String {
    format!("id:{index:06x}")
}

/// Owns the two monotonic filename counters and the `out_dir` they write
/// under. One store per engine process; never shared across `out_dir`s.
#[derive(Debug)]
pub struct ArtifactStore {
    out_dir: PathBuf,
    queue_dir: PathBuf,
    crashes_dir: PathBuf,
    next_queue_id: u64,
    next_crash_id: u64,
}

impl ArtifactStore {
    /// Creates `queue/` and `crashes/` under `out_dir` if they don't
    /// already exist. A `ConfigurationError` at the CLI layer is raised
    /// from the `Err` this returns if `out_dir` turns out not to be
    /// writable.
    pub fn new(out_dir: &Path) -> Result<ArtifactStore> {
        let queue_dir = out_dir.join(QUEUE_DIR);
        let crashes_dir = out_dir.join(CRASHES_DIR);
        for dir in [&queue_dir, &crashes_dir] {
            std::fs::create_dir_all(dir)
                .map_err(|source| QueueError::CreateDir { path: dir.clone(), source })?;
        }
        Ok(ArtifactStore {
            out_dir: out_dir.to_path_buf(),
            queue_dir,
            crashes_dir,
            next_queue_id: 0,
            next_crash_id: 0,
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn write(dir: &Path, index: u64, bytes: &[u8]) -> Result<PathBuf> {
        let path = dir.join(artifact_name(index));
        std::fs::write(&path, bytes).map_err(|source| QueueError::WriteArtifact { path: path.clone(), source })?;
        Ok(path)
    }

    pub fn save_to_queue(&mut self, seed: &Seed) -> Result<PathBuf> {
        let path = Self::write(&self.queue_dir, self.next_queue_id, &seed.concretize())?;
        self.next_queue_id += 1;
        Ok(path)
    }

    pub fn save_to_crashes(&mut self, seed: &Seed) -> Result<PathBuf> {
        let path = Self::write(&self.crashes_dir, self.next_crash_id, &seed.concretize())?;
        self.next_crash_id += 1;
        Ok(path)
    }

    /// Classify one candidate and persist it to whichever of `queue/` and
    /// `crashes/` it qualifies for, updating `stats` along the way
    /// (§4.8 "Classification on save").
    ///
    /// A timeout is first confirmed against the uninstrumented binary:
    /// instrumentation-induced slowness is not a crash, but a native
    /// crash that merely manifested as a timeout under the tracer is.
    pub fn classify_and_persist(
        &mut self,
        executor: &mut dyn Executor,
        seed: &Seed,
        signal: Signal,
        gain: CoverageGain,
        stats: &mut Stats,
    ) -> Result<()> {
        stats.record_test_case();

        let effective_signal = if signal.is_timeout() {
            let native = executor.native_execute(seed)?;
            if native.is_crash() {
                native
            } else {
                signal
            }
        } else {
            signal
        };

        if matches!(gain, CoverageGain::NewEdge) {
            self.save_to_queue(seed)?;
        }

        if effective_signal.is_crash() && matches!(gain, CoverageGain::NewEdge) {
            self.save_to_crashes(seed)?;
            stats.record_crash(effective_signal);
        }

        Ok(())
    }
}
