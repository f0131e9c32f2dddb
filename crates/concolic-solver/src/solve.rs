//! Recursive branch-tree walk (§4.6): dispatches on tree shape and
//! condition kind, accumulating a path constraint and the candidate
//! seeds each solve attempt actually confirms.

use concolic_core::bigint::big_int_to_bytes;
use concolic_core::{constraint, BranchInfo, Constraint, Context, CoverageGain, Direction, Endian, Seed, Signal};
use concolic_infer::{Condition, LinearEquation, Monotonicity};
use concolic_tracer::Executor;
use concolic_tree::{BranchCondition, BranchSeq, BranchTree, DistanceSign};
use num_bigint::BigInt;
use rand::Rng;

use crate::cache::ChunkSolutionCache;
use crate::encode::encode_condition;
use crate::extract::extract_cond;

/// A confirmed candidate: a concrete seed plus the outcome of the
/// execution the solver used to confirm it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub seed: Seed,
    pub signal: Signal,
    pub gain: CoverageGain,
}

/// A solve attempt that runs to completion rarely needs more than a
/// handful of halvings of a single byte's range; this bounds the
/// monotonic binary search so a pathological bracket cannot loop forever.
const MAX_MONOTONIC_STEPS: usize = 64;

fn run_and_classify(executor: &mut dyn Executor, seed: &Seed) -> Option<Candidate> {
    let (signal, gain) = executor.get_coverage(seed).ok()?;
    Some(Candidate { seed: seed.clone(), signal, gain })
}

fn find_next_char<R: Rng + ?Sized>(
    executor: &mut dyn Executor,
    rng: &mut R,
    ctx: &Context,
    n_spawn: usize,
    seed: &Seed,
    target: (u64, usize),
) -> Option<BigInt> {
    let (min, max) = seed.cur_byte_val().min_max(&seed.source);
    let mut infos = Vec::new();
    for _ in 0..n_spawn {
        let v = if min == max { min } else { rng.random_range(min..=max) };
        if let Ok(Some(info)) = executor.get_branch_info_only(seed, &BigInt::from(v), target) {
            infos.push(info);
        }
    }
    if !concolic_infer::check_valid_target(&infos) {
        return None;
    }
    let eq = concolic_infer::gen_comb(&infos)
        .into_iter()
        .find_map(|triple| concolic_infer::linear_eq::find(ctx, &triple))?;
    eq.solutions.into_iter().next()
}

/// `chunk_size == 1`: treat each solved byte as the next character of a
/// string, extending right one byte at a time until the branch is
/// satisfied, the target disappears, or the seed's writable run is
/// exhausted.
fn solve_as_string<R: Rng + ?Sized>(
    executor: &mut dyn Executor,
    rng: &mut R,
    ctx: &Context,
    n_spawn: usize,
    seed: &Seed,
    dir: Direction,
    target: (u64, usize),
    eq: &LinearEquation,
) -> Vec<Candidate> {
    let Some(first_root) = eq.solutions.first().cloned() else {
        return Vec::new();
    };

    let max_len = seed.query_update_bound(dir);
    let mut current = seed.clone();
    let mut next_value = first_root;
    let mut out = Vec::new();

    for _ in 0..max_len {
        let byte = big_int_to_bytes(Endian::Big, 1, &next_value)[0];
        current = current.fix_cur_bytes(dir, &[byte]);

        let Ok(info) = executor.get_branch_info_only(&current, &BigInt::from(byte), target) else {
            break;
        };
        let Some(info) = info else {
            // The target branch no longer fires at all; halt this path.
            break;
        };

        if info.distance == BigInt::from(0) {
            if let Some(candidate) = run_and_classify(executor, &current) {
                out.push(candidate);
            }
            break;
        }

        let Some(advanced) = current.proceed_cursor() else { break };
        current = advanced;

        match find_next_char(executor, rng, ctx, n_spawn, &current, target) {
            Some(v) => next_value = v,
            None => break,
        }
    }

    out
}

/// `chunk_size > 1`: try each inferred integer root directly, encoded as
/// bytes with the equation's recorded endian, skipping anything already
/// tried at this branch point.
fn solve_as_chunk(
    executor: &mut dyn Executor,
    cache: &mut ChunkSolutionCache,
    seed: &Seed,
    dir: Direction,
    target: (u64, usize),
    eq: &LinearEquation,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    for value in &eq.solutions {
        if !cache.mark(eq.endian, eq.chunk_size, value) {
            continue;
        }
        let bytes = big_int_to_bytes(eq.endian, eq.chunk_size, value);
        let candidate_seed = seed.fix_cur_bytes(dir, &bytes);
        let Ok(info) = executor.get_branch_info_only(&candidate_seed, value, target) else {
            continue;
        };
        if let Some(info) = info {
            if info.distance == BigInt::from(0) {
                if let Some(candidate) = run_and_classify(executor, &candidate_seed) {
                    out.push(candidate);
                }
            }
        }
    }
    out
}

fn solve_equation(
    executor: &mut dyn Executor,
    cache: &mut ChunkSolutionCache,
    rng: &mut impl Rng,
    ctx: &Context,
    n_spawn: usize,
    seed: &Seed,
    dir: Direction,
    target: (u64, usize),
    eq: &LinearEquation,
) -> Vec<Candidate> {
    if eq.chunk_size == 1 {
        solve_as_string(executor, rng, ctx, n_spawn, seed, dir, target, eq)
    } else {
        solve_as_chunk(executor, cache, seed, dir, target, eq)
    }
}

/// The branch's observed function value for a probe, on the same scale as
/// `Monotonicity::target_y`: `operand1` unless it already equals the
/// target, in which case the comparison's operands were swapped and
/// `operand2` is the side that moves (mirrors the upstream `GetFunctionValue`).
fn function_value(mono: &Monotonicity, info: &BranchInfo) -> BigInt {
    let operand1 = BigInt::from(info.operand1);
    if operand1 == mono.target_y {
        BigInt::from(info.operand2)
    } else {
        operand1
    }
}

/// Binary search over a monotonic bracket. Each step probes the midpoint
/// encoded both big- and little-endian (the inference can't tell which
/// byte order the comparison actually used), accepting either probe that
/// zeroes the distance and otherwise tightening the bracket on whichever
/// probe made progress.
fn solve_monotonic(
    executor: &mut dyn Executor,
    seed: &Seed,
    dir: Direction,
    target: (u64, usize),
    mono: &Monotonicity,
) -> Vec<Candidate> {
    let update_bound = seed.query_update_bound(dir);
    let mut current = mono.clone();
    let mut out = Vec::new();

    for _ in 0..MAX_MONOTONIC_STEPS {
        if current.byte_len > update_bound {
            break;
        }
        let mid = (&current.lower_x + &current.upper_x) / 2;
        let mut progress = None;
        let mut disappeared = false;

        for &endian in &[Endian::Big, Endian::Little] {
            let bytes = big_int_to_bytes(endian, current.byte_len, &mid);
            let candidate_seed = seed.fix_cur_bytes(dir, &bytes);
            match executor.get_branch_info_only(&candidate_seed, &mid, target) {
                Ok(Some(info)) if info.distance == BigInt::from(0) => {
                    if let Some(candidate) = run_and_classify(executor, &candidate_seed) {
                        out.push(candidate);
                    }
                }
                Ok(Some(info)) => progress = Some(function_value(&current, &info)),
                Ok(None) | Err(_) => disappeared = true,
            }
        }

        if disappeared {
            break;
        }
        match progress {
            Some(y) => current = concolic_infer::monotonicity::update(&current, &mid, &y),
            None => break,
        }
    }

    out
}

/// Splits `pc` against the child-sign-matching constraint and against the
/// opposite one. The caller uses `.0` to continue down the matching path
/// and `.1` to generate seeds that push toward the other branch.
fn update_conditions(
    pc: &Constraint,
    sign: DistanceSign,
    cond_p: &Constraint,
    cond_n: &Constraint,
) -> (Constraint, Constraint) {
    use concolic_core::Sign;
    let (matching, other) = match sign {
        Sign::Positive => (cond_p, cond_n),
        Sign::Negative => (cond_n, cond_p),
        Sign::Zero => (cond_p, cond_n),
    };
    (constraint::conjunction(pc, matching), constraint::conjunction(pc, other))
}

fn solve_inequality(
    executor: &mut dyn Executor,
    seed: &Seed,
    dir: Direction,
    target: (u64, usize),
    ineq: &concolic_infer::LinearInequality,
    dist_sign: DistanceSign,
    pc: &Constraint,
) -> (Constraint, Vec<Candidate>) {
    let Ok((cond_p, cond_n)) = extract_cond(executor, seed, target, ineq) else {
        return (pc.clone(), Vec::new());
    };
    let (matching, flip) = update_conditions(pc, dist_sign, &cond_p, &cond_n);

    let seeds = encode_condition(seed, dir, &flip);
    let candidates = seeds
        .into_iter()
        .filter_map(|s| run_and_classify(executor, &s))
        .collect();

    (matching, candidates)
}

fn solve_branch_cond(
    executor: &mut dyn Executor,
    cache: &mut ChunkSolutionCache,
    rng: &mut impl Rng,
    ctx: &Context,
    n_spawn: usize,
    seed: &Seed,
    dir: Direction,
    branch_cond: &BranchCondition,
    dist_sign: DistanceSign,
    pc: &Constraint,
) -> (Constraint, Vec<Candidate>) {
    let (cond, point) = branch_cond;
    match cond {
        Condition::LinEq(eq) => {
            let seeds = solve_equation(executor, cache, rng, ctx, n_spawn, seed, dir, point.pair(), eq);
            (pc.clone(), seeds)
        }
        Condition::LinIneq(ineq) => solve_inequality(executor, seed, dir, point.pair(), ineq, dist_sign, pc),
        Condition::Mono(mono) => {
            let seeds = solve_monotonic(executor, seed, dir, point.pair(), mono);
            (pc.clone(), seeds)
        }
    }
}

fn solve_branch_seq(
    executor: &mut dyn Executor,
    cache: &mut ChunkSolutionCache,
    rng: &mut impl Rng,
    ctx: &Context,
    n_spawn: usize,
    seed: &Seed,
    dir: Direction,
    seq: &BranchSeq,
    pc: &Constraint,
) -> (Constraint, Vec<Candidate>) {
    let mut pc = pc.clone();
    let mut out = Vec::new();
    for (branch_cond, dist_sign) in &seq.branches {
        let (next_pc, mut seeds) =
            solve_branch_cond(executor, cache, rng, ctx, n_spawn, seed, dir, branch_cond, *dist_sign, &pc);
        pc = next_pc;
        out.append(&mut seeds);
    }
    (pc, out)
}

/// Walk the tree, dispatching on its shape: a `Straight` run materializes
/// its final constraint into seeds; a `Diverge` recurses into every
/// subtree under the same constraint; a `Forked` node extracts per-child
/// constraints from the fork condition before recursing.
pub fn solve_branch_tree(
    executor: &mut dyn Executor,
    cache: &mut ChunkSolutionCache,
    rng: &mut impl Rng,
    ctx: &Context,
    n_spawn: usize,
    seed: &Seed,
    dir: Direction,
    tree: &BranchTree,
    pc: &Constraint,
) -> Vec<Candidate> {
    match tree {
        BranchTree::Straight(seq) => {
            let (pc2, mut out) = solve_branch_seq(executor, cache, rng, ctx, n_spawn, seed, dir, seq, pc);
            let final_seeds = encode_condition(seed, dir, &pc2);
            out.extend(final_seeds.into_iter().filter_map(|s| run_and_classify(executor, &s)));
            out
        }
        BranchTree::Diverge(seq, subtrees) => {
            let (pc2, mut out) = solve_branch_seq(executor, cache, rng, ctx, n_spawn, seed, dir, seq, pc);
            for sub in subtrees {
                out.extend(solve_branch_tree(executor, cache, rng, ctx, n_spawn, seed, dir, sub, &pc2));
            }
            out
        }
        BranchTree::Forked(seq, cond, children) => {
            let (pc2, mut out) = solve_branch_seq(executor, cache, rng, ctx, n_spawn, seed, dir, seq, pc);
            for (child_sign, child_tree) in children {
                let child_pc = match &cond.0 {
                    Condition::LinIneq(ineq) => extract_cond(executor, seed, cond.1.pair(), ineq)
                        .map(|(cond_p, cond_n)| update_conditions(&pc2, *child_sign, &cond_p, &cond_n).0)
                        .unwrap_or_else(|_| pc2.clone()),
                    _ => pc2.clone(),
                };
                out.extend(solve_branch_tree(executor, cache, rng, ctx, n_spawn, seed, dir, child_tree, &child_pc));
            }
            out
        }
    }
}

/// Entry point: walk `tree` from an empty path constraint, producing
/// every candidate seed the solver could confirm along the way.
pub fn solve(
    executor: &mut dyn Executor,
    cache: &mut ChunkSolutionCache,
    rng: &mut impl Rng,
    ctx: &Context,
    n_spawn: usize,
    seed: &Seed,
    dir: Direction,
    tree: &BranchTree,
) -> Vec<Candidate> {
    solve_branch_tree(executor, cache, rng, ctx, n_spawn, seed, dir, tree, &constraint::top())
}
