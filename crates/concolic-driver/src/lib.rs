//! Concolic driver (C7, §4.7).
//!
//! The one pass the queue runs per unfixed cursor position of a popped
//! seed: sample perturbations of the current byte, collect the branch
//! traces those perturbations produce, reconcile them into a tree, and
//! hand the tree to the solver. Nothing here owns a tracer process
//! directly or persists anything to disk; both are the caller's job.

pub mod error;

pub use error::{DriverError, Result};

use concolic_core::{ByteVal, Context, CoverageGain, EngineConfig, Seed, Signal};
use concolic_solver::{solve, ChunkSolutionCache};
use concolic_tracer::Executor;
use num_bigint::BigInt;
use rand::Rng;

/// Run one concolic pass over `seed`'s current cursor byte.
///
/// Returns every candidate the solver confirmed, followed by the sampled
/// byproducts re-classified through [`Executor::get_coverage`] — this
/// order (`solver_results ++ byproducts`) is the ordering guarantee the
/// queue relies on (§5) when it persists results.
pub fn run(
    executor: &mut dyn Executor,
    cache: &mut ChunkSolutionCache,
    rng: &mut impl Rng,
    config: &EngineConfig,
    seed: &Seed,
) -> Result<Vec<(Seed, Signal, CoverageGain)>> {
    tracing::trace!(cursor = seed.cursor_pos, dir = ?seed.cursor_dir, "driver pass starting");

    let (min, max) = seed.cur_byte_val().min_max(&seed.source);
    if min == max {
        tracing::error!(position = seed.cursor_pos, value = min, "cursor byte has no sample range");
        return Err(DriverError::CursorOnFixedByte { position: seed.cursor_pos, value: min });
    }

    let values: Vec<u8> = (min..=max).collect();
    let n_spawn = config.n_spawn.min(values.len());
    let picks = rand::seq::index::sample(rng, values.len(), n_spawn);

    let mut traces = Vec::with_capacity(n_spawn);
    let mut byproducts = Vec::new();

    for idx in picks {
        let v = values[idx];
        let try_value = BigInt::from(v);
        let probed = seed.update_cur_byte(ByteVal::Sampled(v));
        match executor.get_branch_trace(&probed, &try_value) {
            Ok((signal, gain, trace)) => {
                if matches!(gain, CoverageGain::NewEdge) || signal.is_crash() {
                    byproducts.push(probed);
                }
                traces.push(trace);
            }
            Err(err) => {
                tracing::warn!(%err, value = v, "sample execution failed, skipping this perturbation");
            }
        }
    }

    tracing::trace!(sample_count = n_spawn, trace_count = traces.len(), "samples collected");

    let ctx = Context {
        neighbor_bytes: seed.query_neighbor_bytes(seed.cursor_dir),
        byte_dir: seed.cursor_dir,
    };
    let tree = concolic_tree::make(&ctx, &traces)?;
    let tree = concolic_tree::select_and_repair(rng, config.n_solve, &tree);
    tracing::trace!(tree_size = concolic_tree::size(&tree), "branch tree reconciled");

    cache.clear();

    let candidates = solve(executor, cache, rng, &ctx, config.n_spawn, seed, seed.cursor_dir, &tree);
    tracing::trace!(candidate_count = candidates.len(), "solver walk finished");

    let mut out: Vec<(Seed, Signal, CoverageGain)> =
        candidates.into_iter().map(|c| (c.seed, c.signal, c.gain)).collect();

    for byproduct in byproducts {
        match executor.get_coverage(&byproduct) {
            Ok((signal, gain)) => out.push((byproduct, signal, gain)),
            Err(err) => tracing::warn!(%err, "byproduct re-classification failed, dropping it"),
        }
    }

    tracing::trace!(result_count = out.len(), "driver pass finished");
    Ok(out)
}
