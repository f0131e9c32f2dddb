//! Materializes a path constraint into concrete candidate seeds (§4.6).

use concolic_core::{byte_constraint, constraint, Constraint, Direction, Interval, Seed};
use num_bigint::BigInt;

/// `Stay` has no meaning for a byte-offset walk; it is treated as `Right`
/// per the resolved open question in §9.
fn effective_dir(dir: Direction) -> Direction {
    match dir {
        Direction::Stay => Direction::Right,
        other => other,
    }
}

fn saturate_u8(lo: &BigInt, hi: &BigInt) -> Option<(u8, u8)> {
    let zero = BigInt::from(0);
    let max = BigInt::from(255);
    let lo = lo.max(&zero).clone();
    let hi = hi.min(&max).clone();
    if lo > hi {
        return None;
    }
    // Both bounds are now within [0, 255] so the narrowing never truncates.
    let lo: u8 = lo.try_into().ok()?;
    let hi: u8 = hi.try_into().ok()?;
    Some((lo, hi))
}

/// Fan a path constraint out into concrete seeds. A `Top` constraint
/// restricts nothing and contributes no seeds; each non-`Top` byte
/// position multiplies the accumulator by its alternative ranges, with
/// `Bottom` alternatives contributing nothing and `Top` alternatives
/// passing the accumulator through unconstrained.
pub fn encode_condition(seed: &Seed, dir: Direction, condition: &Constraint) -> Vec<Seed> {
    if constraint::is_top(condition) {
        return Vec::new();
    }
    let dir = effective_dir(dir);

    let mut acc = vec![seed.clone()];
    for (offset, bc) in condition.iter().enumerate() {
        if byte_constraint::is_top(bc) {
            continue;
        }
        let mut next = Vec::with_capacity(acc.len() * bc.len());
        for base in &acc {
            for interval in bc {
                match interval {
                    Interval::Bottom => {}
                    Interval::Top => next.push(base.clone()),
                    Interval::Between(lo, hi) => {
                        if let Some((lo, hi)) = saturate_u8(lo, hi) {
                            if let Ok(s) = base.constrain_byte_at(dir, offset, lo, hi) {
                                next.push(s);
                            }
                        }
                    }
                }
            }
        }
        acc = next;
    }
    acc
}
