//! Monotonicity inference (§4.4): when the distance samples are not
//! collinear but still trend consistently in one direction, bracket the
//! target between the nearest known-low and known-high samples and let the
//! solver binary-search the bracket.

use concolic_core::BranchInfo;
use num_bigint::BigInt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tendency {
    Increasing,
    Decreasing,
    Undetermined,
}

/// Upper bound on the bracket's chunk width; an 8-byte operand is the
/// widest the tracer reports.
const MAX_BYTE_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct Monotonicity {
    pub lower_x: BigInt,
    pub lower_y: Option<BigInt>,
    pub upper_x: BigInt,
    pub upper_y: Option<BigInt>,
    pub target_y: BigInt,
    pub tendency: Tendency,
    pub byte_len: usize,
}

/// Whether `ys` trend consistently in one direction as `xs` increases
/// (non-strict: repeated values are allowed, but no direction reversal is).
fn check_monotonic(xs: &[&BigInt], ys: &[&BigInt]) -> Option<Tendency> {
    let mut tendency = None;
    for w in ys.windows(2) {
        if w[0] == w[1] {
            continue;
        }
        let this = if w[1] > w[0] { Tendency::Increasing } else { Tendency::Decreasing };
        match tendency {
            None => tendency = Some(this),
            Some(t) if t == this => {}
            Some(_) => return None,
        }
    }
    let _ = xs;
    tendency
}

/// Infer a monotonic bracket from three branch-info samples, assuming they
/// are already sorted by ascending `try_value`. Returns `None` when the
/// samples don't trend consistently (a reversal rules out monotonicity).
///
/// The bracketed quantity is `operand1` (the branch's computed value), not
/// the distance; `target_y` is the branch's `operand2` (the constant it is
/// compared against), supplied externally rather than read off a sample.
pub fn find(triple: &[BranchInfo; 3]) -> Option<Monotonicity> {
    let xs: Vec<&BigInt> = triple.iter().map(|b| &b.try_value).collect();
    let ys: Vec<BigInt> = triple.iter().map(|b| BigInt::from(b.operand1)).collect();
    let ys_ref: Vec<&BigInt> = ys.iter().collect();
    let tendency = check_monotonic(&xs, &ys_ref)?;

    let byte_len = triple
        .iter()
        .map(|b| b.operand_size)
        .max()
        .unwrap_or(1);
    let target_y = BigInt::from(triple[0].operand2);

    Some(Monotonicity {
        lower_x: triple[0].try_value.clone(),
        lower_y: Some(ys[0].clone()),
        upper_x: triple[2].try_value.clone(),
        upper_y: Some(ys[2].clone()),
        target_y,
        tendency,
        byte_len,
    })
}

/// Tighten the bracket after observing one more `(x, y)` sample. Moves
/// whichever bound the new sample improves on, growing `byte_len` by one
/// (capped at [`MAX_BYTE_LEN`]) so the solver widens its binary search once
/// the current chunk width is exhausted.
pub fn update(monotonic: &Monotonicity, x: &BigInt, y: &BigInt) -> Monotonicity {
    let mut next = monotonic.clone();
    let improves_lower = match monotonic.tendency {
        Tendency::Increasing => y < &monotonic.target_y,
        Tendency::Decreasing => y > &monotonic.target_y,
        Tendency::Undetermined => false,
    };
    let improves_upper = match monotonic.tendency {
        Tendency::Increasing => y > &monotonic.target_y,
        Tendency::Decreasing => y < &monotonic.target_y,
        Tendency::Undetermined => false,
    };
    if improves_lower {
        next.lower_x = x.clone();
        next.lower_y = Some(y.clone());
    } else if improves_upper {
        next.upper_x = x.clone();
        next.upper_y = Some(y.clone());
    }
    next.byte_len = (monotonic.byte_len + 1).min(MAX_BYTE_LEN);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use concolic_core::CompareType;

    fn br(try_value: i64, operand1: u64, operand2: u64) -> BranchInfo {
        BranchInfo {
            inst_addr: 0x3000,
            branch_type: CompareType::SignedSize,
            try_value: BigInt::from(try_value),
            operand_size: 1,
            operand1,
            operand2,
            distance: BigInt::from(operand1 as i64 - operand2 as i64),
        }
    }

    #[test]
    fn scenario_3_monotonic_target() {
        // f(x) == 0x4a where f is strictly increasing; samples at
        // x = 0x30, 0x70, 0x90 give f = 0x12, 0x4e, 0x62.
        let triple = [br(0x30, 0x12, 0x4a), br(0x70, 0x4e, 0x4a), br(0x90, 0x62, 0x4a)];
        let mono = find(&triple).expect("monotonicity expected");
        assert_eq!(mono.tendency, Tendency::Increasing);
        assert_eq!(mono.lower_x, BigInt::from(0x30));
        assert_eq!(mono.lower_y, Some(BigInt::from(0x12)));
        assert_eq!(mono.upper_x, BigInt::from(0x90));
        assert_eq!(mono.upper_y, Some(BigInt::from(0x62)));
        assert_eq!(mono.target_y, BigInt::from(0x4a));
        assert!(mono.byte_len >= 1);
    }

    #[test]
    fn decreasing_trend_is_detected() {
        let triple = [br(0x10, 0x40, 0x4a), br(0x20, 0x20, 0x4a), br(0x30, 0x05, 0x4a)];
        let mono = find(&triple).unwrap();
        assert_eq!(mono.tendency, Tendency::Decreasing);
    }

    #[test]
    fn direction_reversal_rules_out_monotonicity() {
        let triple = [br(0x10, 0x05, 0x4a), br(0x20, 0x40, 0x4a), br(0x30, 0x02, 0x4a)];
        assert!(find(&triple).is_none());
    }

    #[test]
    fn update_moves_lower_bound_on_progress_below_target() {
        let mono = Monotonicity {
            lower_x: 0x10.into(),
            lower_y: Some(0x05.into()),
            upper_x: 0x70.into(),
            upper_y: Some(0x4e.into()),
            target_y: 0x2c.into(),
            tendency: Tendency::Increasing,
            byte_len: 1,
        };
        let next = update(&mono, &BigInt::from(0x40), &BigInt::from(0x18));
        assert_eq!(next.lower_x, BigInt::from(0x40));
        assert_eq!(next.upper_x, BigInt::from(0x70));
        assert_eq!(next.byte_len, 2);
    }

    #[test]
    fn update_moves_upper_bound_on_progress_above_target() {
        let mono = Monotonicity {
            lower_x: 0x10.into(),
            lower_y: Some(0x05.into()),
            upper_x: 0x70.into(),
            upper_y: Some(0x4e.into()),
            target_y: 0x2c.into(),
            tendency: Tendency::Increasing,
            byte_len: 1,
        };
        let next = update(&mono, &BigInt::from(0x50), &BigInt::from(0x38));
        assert_eq!(next.upper_x, BigInt::from(0x50));
        assert_eq!(next.lower_x, BigInt::from(0x10));
    }

    #[test]
    fn update_caps_byte_len_at_max() {
        let mono = Monotonicity {
            lower_x: 0.into(),
            lower_y: Some(0.into()),
            upper_x: 1.into(),
            upper_y: Some(1.into()),
            target_y: 5.into(),
            tendency: Tendency::Increasing,
            byte_len: 8,
        };
        let next = update(&mono, &BigInt::from(2), &BigInt::from(3));
        assert_eq!(next.byte_len, 8);
    }
}
