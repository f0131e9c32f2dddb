//! The `distance = slope · (x − x0) + y0` model shared by linear
//! equations and (the tight half of) linear inequalities.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};

/// A fitted line through sample points, kept as an exact rational slope so
/// roots never get rounded away.
#[derive(Debug, Clone, PartialEq)]
pub struct Linearity {
    pub slope: BigRational,
    pub x0: BigInt,
    pub y0: BigInt,
    pub target: BigInt,
}

impl Linearity {
    /// Fit a line through two `(x, y)` points, or `None` if the points
    /// share an `x` (a vertical line has no rational slope).
    pub fn fit(x1: &BigInt, y1: &BigInt, x2: &BigInt, y2: &BigInt) -> Option<Linearity> {
        if x1 == x2 {
            return None;
        }
        let dx = BigRational::from_integer(x2.clone() - x1.clone());
        let dy = BigRational::from_integer(y2.clone() - y1.clone());
        Some(Linearity { slope: dy / dx, x0: x1.clone(), y0: y1.clone(), target: BigInt::zero() })
    }

    /// Whether a third point lies on this line exactly.
    pub fn fits(&self, x: &BigInt, y: &BigInt) -> bool {
        let lhs = &self.slope * BigRational::from_integer(x.clone() - self.x0.clone());
        let rhs = BigRational::from_integer(y.clone() - self.y0.clone());
        lhs == rhs
    }

    /// Solve `slope · (x − x0) + y0 = target` for `x`. `None` if the slope
    /// is zero (unsolvable/degenerate) or the root is not integral.
    pub fn solve_for_x(&self) -> Option<BigInt> {
        if self.slope.is_zero() {
            return None;
        }
        let rhs = BigRational::from_integer(self.target.clone() - self.y0.clone());
        let x_offset = rhs / &self.slope;
        if x_offset.is_integer() {
            Some(self.x0.clone() + x_offset.to_integer())
        } else {
            None
        }
    }

    /// `true` once `target` is set and the fitted root exists and is
    /// non-negative progress toward zero distance; used by monotonic-style
    /// callers that only care about direction, not an exact intersection.
    pub fn slope_sign_matches(&self, want_positive: bool) -> bool {
        if want_positive {
            self.slope.is_positive()
        } else {
            self.slope.is_negative()
        }
    }
}

/// Fit three ordered points onto a single line with a common slope, using
/// cross-multiplication so the collinearity check never introduces
/// rounding. Returns `None` if the points are not exactly collinear.
pub fn fit_triple(
    x1: &BigInt,
    y1: &BigInt,
    x2: &BigInt,
    y2: &BigInt,
    x3: &BigInt,
    y3: &BigInt,
) -> Option<Linearity> {
    let dx12 = x2 - x1;
    let dx13 = x3 - x1;
    if dx12.is_zero() || dx13.is_zero() {
        return None;
    }
    let dy12 = y2 - y1;
    let dy13 = y3 - y1;
    // Collinearity without division: dy13 * dx12 == dy12 * dx13
    if &dy13 * &dx12 != &dy12 * &dx13 {
        return None;
    }
    Linearity::fit(x1, y1, x2, y2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_triple_rejects_non_collinear_points() {
        let (x1, y1) = (BigInt::from(0), BigInt::from(0));
        let (x2, y2) = (BigInt::from(1), BigInt::from(1));
        let (x3, y3) = (BigInt::from(2), BigInt::from(5)); // not on y=x
        assert!(fit_triple(&x1, &y1, &x2, &y2, &x3, &y3).is_none());
    }

    #[test]
    fn fit_triple_accepts_collinear_points_with_rational_slope() {
        // y = (1/2) x, using x in {0, 2, 4} -> y in {0, 1, 2}
        let (x1, y1) = (BigInt::from(0), BigInt::from(0));
        let (x2, y2) = (BigInt::from(2), BigInt::from(1));
        let (x3, y3) = (BigInt::from(4), BigInt::from(2));
        let lin = fit_triple(&x1, &y1, &x2, &y2, &x3, &y3).unwrap();
        assert_eq!(lin.slope, BigRational::new(1.into(), 2.into()));
    }

    #[test]
    fn solve_for_x_finds_integral_root() {
        let lin = Linearity { slope: BigRational::from_integer(2.into()), x0: 0x30.into(), y0: 0x60.into(), target: 0x4a.into() };
        assert_eq!(lin.solve_for_x(), Some(BigInt::from(0x25)));
    }

    #[test]
    fn solve_for_x_rejects_non_integral_root() {
        let lin = Linearity { slope: BigRational::new(2.into(), 1.into()), x0: 0.into(), y0: 0.into(), target: 1.into() };
        assert_eq!(lin.solve_for_x(), None);
    }

    #[test]
    fn solve_for_x_rejects_zero_slope() {
        let lin = Linearity { slope: BigRational::from_integer(0.into()), x0: 0.into(), y0: 0.into(), target: 5.into() };
        assert_eq!(lin.solve_for_x(), None);
    }
}
