//! Linear inequality inference (§4.4): a *tight* exact boundary when the
//! distance-to-zero fit resolves cleanly, and/or a *loose* bracket of
//! neighboring samples with opposite-sign distances when it does not.

use crate::linear_eq::{self, LinearEquation};
use crate::linearity::Linearity;
use concolic_core::{BranchInfo, CompareType, Context, Endian, Sign, Signedness};
use num_bigint::BigInt;

const MAX_SPLIT_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleLinearInequality {
    pub endian: Endian,
    pub chunk_size: usize,
    pub linearity: Linearity,
    pub split_points: Vec<(BigInt, BigInt)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearInequality {
    pub tight: Option<LinearEquation>,
    pub loose: Option<SimpleLinearInequality>,
    pub sign: Signedness,
}

fn sign_of(v: &BigInt) -> Sign {
    Sign::of_bigint(v)
}

/// Sign changes between adjacent (sorted-by-`try_value`) samples: each
/// crossing becomes one `(x, x')` split point, capped at three.
fn find_split_points(triple: &[BranchInfo; 3]) -> Vec<(BigInt, BigInt)> {
    let mut points = Vec::new();
    for w in triple.windows(2) {
        let (a, b) = (&w[0], &w[1]);
        if sign_of(&a.distance) != sign_of(&b.distance) && points.len() < MAX_SPLIT_POINTS {
            points.push((a.try_value.clone(), b.try_value.clone()));
        }
    }
    points
}

/// Infer a linear inequality from three branch-info samples at the same
/// branch point. Returns `None` if there is neither a usable tight
/// equation nor any sign-crossing split point to build a loose bracket
/// from (i.e. all three samples have the same distance sign).
pub fn find(ctx: &Context, triple: &[BranchInfo; 3]) -> Option<LinearInequality> {
    let sign = triple[0].branch_type.signedness();
    let tight = linear_eq::find(ctx, triple);

    let split_points = find_split_points(triple);
    let loose = if split_points.is_empty() {
        None
    } else {
        let lin = Linearity::fit(
            &triple[0].try_value,
            &triple[0].distance,
            &triple[2].try_value,
            &triple[2].distance,
        )
        .unwrap_or(Linearity {
            slope: num_rational::BigRational::from_integer(0.into()),
            x0: triple[0].try_value.clone(),
            y0: triple[0].distance.clone(),
            target: 0.into(),
        });
        Some(SimpleLinearInequality { endian: Endian::Big, chunk_size: 1, linearity: lin, split_points })
    };

    if tight.is_none() && loose.is_none() {
        return None;
    }
    Some(LinearInequality { tight, loose, sign })
}

#[cfg(test)]
mod tests {
    use super::*;
    use concolic_core::Direction;

    fn br(ct: CompareType, try_value: i64, operand1: u64, operand2: u64, distance: i64) -> BranchInfo {
        BranchInfo {
            inst_addr: 0x2000,
            branch_type: ct,
            try_value: BigInt::from(try_value),
            operand_size: 1,
            operand1,
            operand2,
            distance: BigInt::from(distance),
        }
    }

    #[test]
    fn scenario_2_linear_inequality_signed() {
        // if (input[0] < 0x5e) abort(); samples straddling the boundary,
        // each comparing its own try_value against the constant 0x5e.
        let triple = [
            br(CompareType::SignedSize, 0x50, 0x50, 0x5e, -0x0e),
            br(CompareType::SignedSize, 0x5e, 0x5e, 0x5e, 0),
            br(CompareType::SignedSize, 0x70, 0x70, 0x5e, 0x12),
        ];
        let ctx = Context { neighbor_bytes: vec![0x50], byte_dir: Direction::Right };
        let ineq = find(&ctx, &triple).expect("inequality expected");
        assert_eq!(ineq.sign, Signedness::Signed);
        let tight = ineq.tight.expect("tight equation expected");
        assert_eq!(tight.solutions, vec![BigInt::from(0x5e)]);
    }

    #[test]
    fn unsigned_compare_carries_unsigned_sign() {
        let triple = [
            br(CompareType::UnsignedSize, 10, 10, 15, -5),
            br(CompareType::UnsignedSize, 15, 15, 15, 0),
            br(CompareType::UnsignedSize, 20, 20, 15, 5),
        ];
        let ctx = Context { neighbor_bytes: vec![10], byte_dir: Direction::Right };
        let ineq = find(&ctx, &triple).unwrap();
        assert_eq!(ineq.sign, Signedness::Unsigned);
    }

    #[test]
    fn no_sign_crossing_and_no_tight_fit_yields_none() {
        let triple = [
            br(CompareType::SignedSize, 1, 6, 0, 5),
            br(CompareType::SignedSize, 2, 9, 0, 9),
            br(CompareType::SignedSize, 3, 2, 0, 2),
        ];
        let ctx = Context { neighbor_bytes: vec![1], byte_dir: Direction::Right };
        // all positive distances (no crossing) and non-collinear operand1s (no tight fit)
        assert!(find(&ctx, &triple).is_none());
    }
}
