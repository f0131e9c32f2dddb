//! Interval and constraint algebra used to propagate conditions along a
//! solved path (§4.3). `Interval` is the base lattice; `ByteConstraint` is
//! a disjunction of intervals for one byte; `Constraint` is a per-byte
//! vector of those disjunctions, conjoined elementwise.

use num_bigint::BigInt;

/// `Top` is the conjunction identity, `Bottom` is absorbing, and
/// `Between(lo, hi)` is an inclusive range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interval {
    Bottom,
    Top,
    Between(BigInt, BigInt),
}

impl Interval {
    pub fn between(low: impl Into<BigInt>, high: impl Into<BigInt>) -> Interval {
        let (low, high) = (low.into(), high.into());
        if low > high {
            Interval::Bottom
        } else {
            Interval::Between(low, high)
        }
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Interval::Bottom)
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Interval::Top)
    }

    /// `Top ∧ x = x`, `Bottom ∧ x = Bottom`, and two `Between`s conjoin to
    /// their overlap (or `Bottom` if they don't overlap).
    pub fn conjunction(a: &Interval, b: &Interval) -> Interval {
        match (a, b) {
            (Interval::Bottom, _) | (_, Interval::Bottom) => Interval::Bottom,
            (Interval::Top, x) | (x, Interval::Top) => x.clone(),
            (Interval::Between(a_lo, a_hi), Interval::Between(b_lo, b_hi)) => {
                let lo = a_lo.max(b_lo).clone();
                let hi = a_hi.min(b_hi).clone();
                if lo <= hi {
                    Interval::Between(lo, hi)
                } else {
                    Interval::Bottom
                }
            }
        }
    }
}

/// A disjunction of alternative ranges for one byte.
pub type ByteConstraint = Vec<Interval>;

pub mod byte_constraint {
    use super::Interval;
    use crate::interval::ByteConstraint;

    pub fn top() -> ByteConstraint {
        vec![Interval::Top]
    }

    pub fn bottom() -> ByteConstraint {
        vec![Interval::Bottom]
    }

    pub fn is_top(c: &ByteConstraint) -> bool {
        c.len() == 1 && c[0].is_top()
    }

    pub fn is_bottom(c: &ByteConstraint) -> bool {
        !c.is_empty() && c.iter().all(Interval::is_bottom)
    }

    /// Drop `Bottom` alternatives; collapse to `[Top]` if any alternative
    /// is `Top`; collapse to `[]` if every alternative was `Bottom`.
    /// Idempotent: re-normalizing a normalized constraint is a no-op.
    pub fn normalize(ranges: &ByteConstraint) -> ByteConstraint {
        if ranges.iter().any(Interval::is_top) {
            return vec![Interval::Top];
        }
        ranges.iter().filter(|r| !r.is_bottom()).cloned().collect()
    }

    /// Pairwise product of every alternative on each side, then normalize.
    pub fn conjunction(c1: &ByteConstraint, c2: &ByteConstraint) -> ByteConstraint {
        let mut product = Vec::with_capacity(c1.len() * c2.len());
        for a in c1 {
            for b in c2 {
                product.push(Interval::conjunction(a, b));
            }
        }
        normalize(&product)
    }

    pub fn make(pairs: &[(num_bigint::BigInt, num_bigint::BigInt)]) -> ByteConstraint {
        normalize(
            &pairs
                .iter()
                .map(|(lo, hi)| Interval::between(lo.clone(), hi.clone()))
                .collect::<Vec<_>>(),
        )
    }
}

/// Per-byte constraints for every byte a condition touches, conjoined
/// elementwise (shorter side padded with `Top`).
pub type Constraint = Vec<ByteConstraint>;

pub mod constraint {
    use super::{byte_constraint, ByteConstraint, Interval};
    use crate::interval::Constraint;
    use crate::typedef::Endian;
    use num_bigint::BigInt;

    pub fn top() -> Constraint {
        Vec::new()
    }

    pub fn is_top(c: &Constraint) -> bool {
        c.iter().all(byte_constraint::is_top) || c.is_empty()
    }

    pub fn is_bottom(c: &Constraint) -> bool {
        c.iter().any(byte_constraint::is_bottom)
    }

    /// Zip elementwise, filling whichever side is shorter with `Top`.
    pub fn conjunction(c1: &Constraint, c2: &Constraint) -> Constraint {
        let len = c1.len().max(c2.len());
        let top: ByteConstraint = byte_constraint::top();
        (0..len)
            .map(|i| {
                let a = c1.get(i).unwrap_or(&top);
                let b = c2.get(i).unwrap_or(&top);
                byte_constraint::conjunction(a, b)
            })
            .collect()
    }

    /// Build a constraint restricting only the most-significant byte to
    /// `msb_ranges`; every other byte of a `size`-byte operand is `Top`.
    /// The MSB sits at index 0 for big-endian, index `size - 1` for
    /// little-endian.
    pub fn make(msb_ranges: &[(BigInt, BigInt)], endian: Endian, size: usize) -> Constraint {
        let msb = byte_constraint::make(msb_ranges);
        let mut out = vec![byte_constraint::top(); size];
        let msb_pos = match endian {
            Endian::Big => 0,
            Endian::Little => size - 1,
        };
        out[msb_pos] = msb;
        out
    }

    /// Placeholder for symmetry with the other `Interval`-family make
    /// functions; unused directly but documents that `Between` is the
    /// sole non-trivial alternative shape at the `Interval` layer.
    #[allow(dead_code)]
    fn _between(lo: BigInt, hi: BigInt) -> Interval {
        Interval::between(lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_is_conjunction_identity() {
        let x = Interval::between(1, 10);
        assert_eq!(Interval::conjunction(&Interval::Top, &x), x.clone());
        assert_eq!(Interval::conjunction(&x, &Interval::Top), x);
    }

    #[test]
    fn bottom_is_absorbing() {
        let x = Interval::between(1, 10);
        assert_eq!(Interval::conjunction(&Interval::Bottom, &x), Interval::Bottom);
    }

    #[test]
    fn conjunction_is_commutative_and_associative() {
        let a = Interval::between(0, 10);
        let b = Interval::between(5, 15);
        let c = Interval::between(7, 20);
        assert_eq!(
            Interval::conjunction(&a, &b),
            Interval::conjunction(&b, &a)
        );
        let lhs = Interval::conjunction(&Interval::conjunction(&a, &b), &c);
        let rhs = Interval::conjunction(&a, &Interval::conjunction(&b, &c));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn disjoint_between_is_bottom() {
        let a = Interval::between(0, 5);
        let b = Interval::between(10, 20);
        assert_eq!(Interval::conjunction(&a, &b), Interval::Bottom);
    }

    #[test]
    fn normalize_idempotent_and_collapses() {
        let with_top = vec![Interval::between(1, 2), Interval::Top];
        let normalized = byte_constraint::normalize(&with_top);
        assert_eq!(normalized, vec![Interval::Top]);
        assert_eq!(byte_constraint::normalize(&normalized), normalized);

        let all_bottom = vec![Interval::Bottom, Interval::Bottom];
        assert_eq!(byte_constraint::normalize(&all_bottom), Vec::<Interval>::new());
    }

    #[test]
    fn constraint_conjunction_with_top_is_identity() {
        let pc: Constraint = vec![byte_constraint::make(&[(BigInt::from(1), BigInt::from(5))])];
        let joined = constraint::conjunction(&pc, &constraint::top());
        assert_eq!(joined, pc);
    }

    #[test]
    fn make_restricts_only_msb_big_endian() {
        let c = constraint::make(&[(BigInt::from(1), BigInt::from(2))], Endian::Big, 4);
        assert!(!byte_constraint::is_top(&c[0]));
        assert!(byte_constraint::is_top(&c[1]));
        assert!(byte_constraint::is_top(&c[2]));
        assert!(byte_constraint::is_top(&c[3]));
    }

    #[test]
    fn make_restricts_only_msb_little_endian() {
        let c = constraint::make(&[(BigInt::from(1), BigInt::from(2))], Endian::Little, 4);
        assert!(byte_constraint::is_top(&c[0]));
        assert!(!byte_constraint::is_top(&c[3]));
    }
}
