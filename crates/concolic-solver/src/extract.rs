//! Turns an inferred [`LinearInequality`] into complementary positive/negative
//! byte constraints (§4.6).

use concolic_core::{constraint, Constraint, Endian, Seed, Sign, Signedness};
use concolic_infer::LinearInequality;
use concolic_tracer::Executor;
use num_bigint::BigInt;
use num_traits::Zero;

use crate::error::Result;

fn opposite(sign: Sign) -> Sign {
    match sign {
        Sign::Positive => Sign::Negative,
        Sign::Negative => Sign::Positive,
        Sign::Zero => Sign::Zero,
    }
}

/// Sweep sorted boundary splits into two complementary range lists. The
/// sign tagging a boundary describes the side *at and after* it; the run
/// leading up to a boundary therefore belongs to the opposite sign, and
/// the run after the last boundary belongs to the last boundary's sign.
pub fn generate_msb_ranges(splits: &[(BigInt, Sign)], max: &BigInt) -> (Vec<(BigInt, BigInt)>, Vec<(BigInt, BigInt)>) {
    let mut sorted = splits.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut positive = Vec::new();
    let mut negative = Vec::new();
    let mut prev_low = BigInt::zero();
    let mut last_sign = Sign::Positive;

    for (boundary, sign) in &sorted {
        let run_high = boundary - 1;
        if prev_low <= run_high {
            match opposite(*sign) {
                Sign::Positive => positive.push((prev_low.clone(), run_high)),
                Sign::Negative => negative.push((prev_low.clone(), run_high)),
                Sign::Zero => {}
            }
        }
        prev_low = boundary.clone();
        last_sign = *sign;
    }

    if &prev_low <= max {
        match last_sign {
            Sign::Positive => positive.push((prev_low, max.clone())),
            Sign::Negative => negative.push((prev_low, max.clone())),
            Sign::Zero => {}
        }
    }

    (positive, negative)
}

fn msb_shift(v: &BigInt, chunk_size: usize) -> BigInt {
    if chunk_size <= 1 {
        v.clone()
    } else {
        v >> (8 * (chunk_size - 1))
    }
}

/// Collect boundary splits from the tight equation's roots, preferring it
/// over the loose bracket's sign-crossing pairs (§4.6).
fn collect_splits(
    executor: &mut dyn Executor,
    seed: &Seed,
    target: (u64, usize),
    ineq: &LinearInequality,
) -> Result<(Endian, usize, Vec<(BigInt, Sign)>)> {
    if let Some(tight) = &ineq.tight {
        let mut splits = Vec::new();
        for s in &tight.solutions {
            let lo = s - 1;
            let info_lo = executor.get_branch_info_only(seed, &lo, target)?;
            let info_hi = executor.get_branch_info_only(seed, s, target)?;
            if let (Some(info_lo), Some(_)) = (info_lo, info_hi) {
                splits.push((s.clone(), Sign::of_bigint(&info_lo.distance)));
            }
        }
        return Ok((tight.endian, tight.chunk_size, splits));
    }

    if let Some(loose) = &ineq.loose {
        let mut splits = Vec::new();
        for (x, x_prime) in &loose.split_points {
            let info_lo = executor.get_branch_info_only(seed, x, target)?;
            let info_hi = executor.get_branch_info_only(seed, x_prime, target)?;
            if let (Some(info_lo), Some(info_hi)) = (info_lo, info_hi) {
                let (sign_lo, sign_hi) = (Sign::of_bigint(&info_lo.distance), Sign::of_bigint(&info_hi.distance));
                if sign_lo != sign_hi {
                    splits.push((x_prime.clone(), sign_lo));
                }
            }
        }
        return Ok((loose.endian, loose.chunk_size, splits));
    }

    Ok((Endian::Big, 1, Vec::new()))
}

/// Extract complementary positive/negative byte constraints for an
/// inferred size-compare inequality at `target`.
pub fn extract_cond(
    executor: &mut dyn Executor,
    seed: &Seed,
    target: (u64, usize),
    ineq: &LinearInequality,
) -> Result<(Constraint, Constraint)> {
    let (endian, chunk_size, splits) = collect_splits(executor, seed, target, ineq)?;

    let shifted: Vec<(BigInt, Sign)> =
        splits.iter().map(|(v, s)| (msb_shift(v, chunk_size), *s)).collect();

    let max = if ineq.sign == Signedness::Signed { BigInt::from(127) } else { BigInt::from(255) };
    let (pos_ranges, neg_ranges) = generate_msb_ranges(&shifted, &max);

    let positive = constraint::make(&pos_ranges, endian, chunk_size);
    let negative = constraint::make(&neg_ranges, endian, chunk_size);
    Ok((positive, negative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_boundary_splits_complement_each_other() {
        let splits = vec![(BigInt::from(50), Sign::Positive)];
        let (pos, neg) = generate_msb_ranges(&splits, &BigInt::from(255));
        assert_eq!(pos, vec![(BigInt::from(50), BigInt::from(255))]);
        assert_eq!(neg, vec![(BigInt::from(0), BigInt::from(49))]);
    }

    #[test]
    fn ranges_cover_the_whole_space_without_overlap() {
        let splits = vec![
            (BigInt::from(30), Sign::Negative),
            (BigInt::from(100), Sign::Positive),
            (BigInt::from(200), Sign::Negative),
        ];
        let max = BigInt::from(255);
        let (pos, neg) = generate_msb_ranges(&splits, &max);

        let mut all: Vec<(BigInt, BigInt)> = pos.iter().chain(neg.iter()).cloned().collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));

        let mut cursor = BigInt::from(0);
        for (lo, hi) in &all {
            assert_eq!(lo, &cursor, "ranges must be contiguous with no gap or overlap");
            cursor = hi + 1;
        }
        assert_eq!(cursor, &max + 1);
    }

    #[test]
    fn no_splits_assigns_everything_to_the_default_sign() {
        let (pos, neg) = generate_msb_ranges(&[], &BigInt::from(255));
        assert_eq!(pos, vec![(BigInt::from(0), BigInt::from(255))]);
        assert!(neg.is_empty());
    }
}
