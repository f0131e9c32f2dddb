//! The main fuzz loop (§4.10): pop a seed, run one concolic pass per
//! initially-unfixed cursor position, persist and re-queue whatever the
//! pass returns, repeat until the queue drains or the time budget runs
//! out.
//!
//! Nothing here is reachable from outside the binary; it is the one
//! place that owns every piece of process-wide mutable state (§5, §9)
//! for the lifetime of a run: the [`Stats`] counters, the
//! [`ChunkSolutionCache`], and the queue's artifact-id counters.

use concolic_core::{EngineConfig, InputSource, Priority, Seed};
use concolic_queue::{load_initial_corpus, ArtifactStore, ConcolicQueue, Stats, TimeBudget};
use concolic_solver::ChunkSolutionCache;
use concolic_tracer::{Executor, SubprocessExecutor};
use rand::rngs::StdRng;
use rand::SeedableRng;

use anyhow::Result;

fn input_source(config: &EngineConfig) -> InputSource {
    match &config.filepath {
        Some(path) => InputSource::FileInput(path.clone()),
        None => InputSource::StdInput,
    }
}

/// Run one concolic pass per position that was unfixed when `seed` was
/// popped (§4.8: "iterating its cursor through all initially-unfixed
/// positions"). Positions are snapshotted up front so a pass that fixes
/// a later byte doesn't shrink the set a sibling pass iterates over.
fn concolic_pass(
    executor: &mut dyn Executor,
    cache: &mut ChunkSolutionCache,
    rng: &mut StdRng,
    config: &EngineConfig,
    artifacts: &mut ArtifactStore,
    stats: &mut Stats,
    queue: &mut ConcolicQueue,
    seed: &Seed,
) -> Result<()> {
    let positions: Vec<usize> =
        seed.byte_vals.iter().enumerate().filter(|(_, b)| b.is_unfixed()).map(|(i, _)| i).collect();

    for pos in positions {
        let probe = seed.set_cursor_pos(pos);
        tracing::debug!(position = pos, "concolic pass over cursor position");

        let results = concolic_driver::run(executor, cache, rng, config, &probe)?;
        for (candidate, signal, gain) in results {
            artifacts.classify_and_persist(executor, &candidate, signal, gain, stats)?;
            queue.push(candidate, gain);
        }
    }
    Ok(())
}

/// Entry point for the CLI binary: build every piece of engine state
/// from a validated [`EngineConfig`] and run the loop to completion.
///
/// Returns `Ok(())` on a clean shutdown, whether that's the queue
/// draining or the time budget expiring (§6: both exit 0). Any `Err`
/// reaching the caller is an execution or invariant failure that should
/// surface as a non-zero exit.
pub fn run(config: &EngineConfig) -> Result<()> {
    let source = input_source(config);
    let mut executor = SubprocessExecutor::new(config)?;
    let mut artifacts = ArtifactStore::new(&config.output_dir)?;
    let mut queue = ConcolicQueue::new();
    let mut stats = Stats::new();
    let mut cache = ChunkSolutionCache::new();
    let mut rng = StdRng::from_os_rng();
    let budget = TimeBudget::new(config.time_limit);

    if let Some(input_dir) = &config.input_dir {
        for seed in load_initial_corpus(input_dir, source.clone())? {
            queue.push_with_priority(seed, Priority::Normal);
        }
        tracing::info!(count = queue.len(), "loaded initial corpus");
    }

    let mut rounds = 0u64;
    while budget.check_and_reserve_time() {
        let Some(item) = queue.pop() else {
            tracing::info!("queue drained, shutting down");
            break;
        };
        tracing::debug!(priority = ?item.priority, cursor = item.seed.cursor_pos, "popped seed");

        concolic_pass(&mut executor, &mut cache, &mut rng, config, &mut artifacts, &mut stats, &mut queue, &item.seed)?;

        rounds += 1;
        if rounds % 100 == 0 {
            tracing::info!(
                rounds,
                total_test_cases = stats.total_test_cases(),
                total_crashes = stats.total_crashes(),
                queue_len = queue.len(),
                "progress"
            );
            stats.reset_round();
        }
    }

    tracing::info!(
        total_test_cases = stats.total_test_cases(),
        total_crashes = stats.total_crashes(),
        "run finished"
    );
    Ok(())
}
