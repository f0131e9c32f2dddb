//! Numeric inference over branch-info triples (§4.4).
//!
//! Each probed branch point accumulates a short trace of `BranchInfo`
//! samples as the cursor byte is perturbed. This crate turns that trace
//! into one of three algebraic models — a linear equation, a linear
//! inequality, or a monotonic bracket — by trying small combinations of
//! three samples until one fits. Inference failure is never fatal: an
//! `Option::None` here just means the tree builder records no condition
//! for that point and treats it as a divergence instead.

pub mod linear_eq;
pub mod linear_ineq;
pub mod linearity;
pub mod monotonicity;

pub use linear_eq::LinearEquation;
pub use linear_ineq::LinearInequality;
pub use monotonicity::Monotonicity;

use concolic_core::{BranchInfo, CompareType, Context};

/// Window size for [`gen_comb`]'s sliding-window sampling strategy. A
/// tuning constant, not runtime configuration (§4.4, §9).
pub const BRANCH_COMB_WINDOW: usize = 10;

/// One of the three forms a branch condition can take, dispatched on by
/// the solver.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    LinEq(LinearEquation),
    LinIneq(LinearInequality),
    Mono(Monotonicity),
}

/// Reject traces too short to infer anything, or where every sample saw
/// the same distance (nothing to fit a trend to).
pub fn check_valid_target(branch_infos: &[BranchInfo]) -> bool {
    if branch_infos.len() < 3 {
        return false;
    }
    let first = &branch_infos[0].distance;
    branch_infos[1..].iter().any(|b| &b.distance != first)
}

fn combinations<T: Clone>(items: &[T], k: usize) -> Vec<Vec<T>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    if items.len() < k {
        return Vec::new();
    }
    let mut out = Vec::new();
    for i in 0..=items.len() - k {
        let head = &items[i];
        for mut tail in combinations(&items[i + 1..], k - 1) {
            tail.insert(0, head.clone());
            out.push(tail);
        }
    }
    out
}

/// Slide a window of [`BRANCH_COMB_WINDOW`] samples over the trace and
/// enumerate `C(window, 3)` within it, pairing every later sample with two
/// from its current window, so a long trace doesn't blow up into
/// `C(n, 3)` candidate triples (§4.4).
pub fn gen_comb(branch_infos: &[BranchInfo]) -> Vec<[BranchInfo; 3]> {
    let to_triple = |v: Vec<BranchInfo>| -> [BranchInfo; 3] {
        let mut it = v.into_iter();
        [it.next().unwrap(), it.next().unwrap(), it.next().unwrap()]
    };

    if branch_infos.len() < BRANCH_COMB_WINDOW {
        return combinations(branch_infos, 3).into_iter().map(to_triple).collect();
    }

    let (head, tail) = branch_infos.split_at(BRANCH_COMB_WINDOW);
    let mut combs: Vec<Vec<BranchInfo>> = combinations(head, 3);
    let mut window: Vec<BranchInfo> = if head.is_empty() { Vec::new() } else { head[1..].to_vec() };

    for next in tail {
        for mut pair in combinations(&window, 2) {
            pair.push(next.clone());
            combs.push(pair);
        }
        if !window.is_empty() {
            window.remove(0);
        }
        window.push(next.clone());
    }

    combs.into_iter().map(to_triple).collect()
}

fn infer_lin_eq(ctx: &Context, branch_infos: &[BranchInfo]) -> Option<LinearEquation> {
    if !check_valid_target(branch_infos) {
        return None;
    }
    gen_comb(branch_infos).iter().find_map(|triple| linear_eq::find(ctx, triple))
}

fn infer_lin_ineq(ctx: &Context, branch_infos: &[BranchInfo]) -> Option<LinearInequality> {
    if !check_valid_target(branch_infos) {
        return None;
    }
    gen_comb(branch_infos).iter().find_map(|triple| linear_ineq::find(ctx, triple))
}

fn infer_mono(branch_infos: &[BranchInfo]) -> Option<Monotonicity> {
    if !check_valid_target(branch_infos) {
        return None;
    }
    gen_comb(branch_infos).iter().find_map(monotonicity::find)
}

/// Infer a single [`Condition`] from the trace of samples observed at one
/// branch point. `Equality` compares try a linear equation first, falling
/// back to monotonicity; `SignedSize`/`UnsignedSize` compares try a linear
/// inequality only, since an exact equality model rarely holds across a
/// range predicate.
pub fn infer(ctx: &Context, branch_infos: &[BranchInfo]) -> Option<Condition> {
    let branch_type = branch_infos.first()?.branch_type;
    match branch_type {
        CompareType::Equality => infer_lin_eq(ctx, branch_infos)
            .map(Condition::LinEq)
            .or_else(|| infer_mono(branch_infos).map(Condition::Mono)),
        CompareType::SignedSize | CompareType::UnsignedSize => {
            infer_lin_ineq(ctx, branch_infos).map(Condition::LinIneq)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concolic_core::Direction;
    use num_bigint::BigInt;

    fn br(ct: CompareType, try_value: i64, distance: i64) -> BranchInfo {
        BranchInfo {
            inst_addr: 0x1000,
            branch_type: ct,
            try_value: BigInt::from(try_value),
            operand_size: 1,
            operand1: 0,
            operand2: 0,
            distance: BigInt::from(distance),
        }
    }

    fn br_op(ct: CompareType, try_value: i64, operand1: u64, operand2: u64) -> BranchInfo {
        BranchInfo {
            inst_addr: 0x1000,
            branch_type: ct,
            try_value: BigInt::from(try_value),
            operand_size: 1,
            operand1,
            operand2,
            distance: BigInt::from(operand1 as i64 - operand2 as i64),
        }
    }

    #[test]
    fn check_valid_target_rejects_short_and_uniform_traces() {
        assert!(!check_valid_target(&[br(CompareType::Equality, 1, 1), br(CompareType::Equality, 2, 1)]));
        let uniform = vec![
            br(CompareType::Equality, 1, 5),
            br(CompareType::Equality, 2, 5),
            br(CompareType::Equality, 3, 5),
        ];
        assert!(!check_valid_target(&uniform));
    }

    #[test]
    fn gen_comb_small_trace_is_full_combination() {
        let trace: Vec<BranchInfo> = (0..5).map(|i| br(CompareType::Equality, i, i)).collect();
        let combs = gen_comb(&trace);
        // C(5,3) = 10
        assert_eq!(combs.len(), 10);
    }

    #[test]
    fn gen_comb_large_trace_uses_sliding_window() {
        let trace: Vec<BranchInfo> =
            (0..(BRANCH_COMB_WINDOW as i64 + 5)).map(|i| br(CompareType::Equality, i, i)).collect();
        let combs = gen_comb(&trace);
        assert!(!combs.is_empty());
        // every generated triple actually came from the trace
        for triple in &combs {
            for b in triple {
                assert!(trace.iter().any(|t| t.try_value == b.try_value));
            }
        }
    }

    #[test]
    fn infer_equality_prefers_linear_equation_over_monotonicity() {
        // b = 2x, compared against 0x4a; collinear operand1s.
        let trace = vec![
            br_op(CompareType::Equality, 0x30, 0x60, 0x4a),
            br_op(CompareType::Equality, 0x35, 0x6a, 0x4a),
            br_op(CompareType::Equality, 0x40, 0x80, 0x4a),
        ];
        let ctx = Context { neighbor_bytes: vec![0x30], byte_dir: Direction::Right };
        let cond = infer(&ctx, &trace).expect("condition expected");
        assert!(matches!(cond, Condition::LinEq(_)));
    }

    #[test]
    fn infer_equality_falls_back_to_monotonicity() {
        // operand1 trends strictly upward but isn't collinear, so the
        // linear-equation fit fails and monotonicity picks it up instead.
        let trace = vec![
            br_op(CompareType::Equality, 0x30, 0x12, 0x50),
            br_op(CompareType::Equality, 0x50, 0x2c, 0x50),
            br_op(CompareType::Equality, 0x70, 0x4e, 0x50),
        ];
        let ctx = Context { neighbor_bytes: vec![0x30], byte_dir: Direction::Right };
        let cond = infer(&ctx, &trace).expect("condition expected");
        assert!(matches!(cond, Condition::Mono(_)));
    }

    #[test]
    fn infer_size_compare_only_tries_inequality() {
        let trace = vec![
            br(CompareType::SignedSize, 0x50, -0x0e),
            br(CompareType::SignedSize, 0x5e, 0),
            br(CompareType::SignedSize, 0x70, 0x12),
        ];
        let ctx = Context { neighbor_bytes: vec![0x50], byte_dir: Direction::Right };
        let cond = infer(&ctx, &trace).expect("condition expected");
        assert!(matches!(cond, Condition::LinIneq(_)));
    }
}
