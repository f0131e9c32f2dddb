//! Linear equation inference (§4.4): `distance = slope · (try_value − x0) + y0`,
//! solved for the root where `distance == 0`.

use crate::linearity::{fit_triple, Linearity};
use concolic_core::bigint::{big_int_to_bytes, bytes_to_big_int};
use concolic_core::{BranchInfo, Context, Endian};
use num_bigint::BigInt;
use num_traits::Zero;

const CHUNK_SIZES: [usize; 3] = [2, 4, 8];

#[derive(Debug, Clone, PartialEq)]
pub struct LinearEquation {
    pub endian: Endian,
    pub chunk_size: usize,
    pub linearity: Linearity,
    /// Up to three integral roots of `linearity` that land inside the
    /// chunk's byte range. In practice a one-variable line has a single
    /// root; the bound mirrors the upstream format that also allows
    /// aliasing across wrapped interpretations.
    pub solutions: Vec<BigInt>,
}

/// Upper bound (exclusive) of the unsigned range an integer of `size`
/// bytes can represent.
fn chunk_range_max(size: usize) -> BigInt {
    (BigInt::from(1) << (8 * size)) - 1
}

fn in_range(v: &BigInt, size: usize) -> bool {
    v >= &BigInt::zero() && v <= &chunk_range_max(size)
}

/// Build a size-byte candidate chunk by substituting `try_value` for the
/// cursor byte inside the seed's current neighbor bytes. Returns `None`
/// when fewer than `size` neighbor bytes are available to draw from.
fn concat_bytes(size: usize, try_value: &BigInt, ctx: &Context) -> Option<Vec<u8>> {
    if ctx.neighbor_bytes.len() < size {
        return None;
    }
    let mut bytes = ctx.neighbor_bytes[..size].to_vec();
    let (_, try_bytes) = try_value.to_bytes_be();
    bytes[0] = *try_bytes.last().unwrap_or(&0);
    Some(bytes)
}

/// Equality branches compare raw byte patterns, not signed magnitudes, so
/// `operand1`/`operand2` are read as plain unsigned values here (unlike
/// [`BranchInfo::operands_as_bigint`], which sign-extends for size
/// comparisons).
fn raw_operands(info: &BranchInfo) -> (BigInt, BigInt) {
    (BigInt::from(info.operand1), BigInt::from(info.operand2))
}

/// Try to fit a single-byte linear equation directly against the three
/// `(try_value, operand1)` samples, targeting the branch's `operand2` (the
/// compared-against constant, not distance-to-zero).
fn find_single_byte(triple: &[BranchInfo; 3]) -> Option<LinearEquation> {
    let (op1_0, target) = raw_operands(&triple[0]);
    let (op1_1, _) = raw_operands(&triple[1]);
    let (op1_2, _) = raw_operands(&triple[2]);
    let mut lin = fit_triple(
        &triple[0].try_value,
        &op1_0,
        &triple[1].try_value,
        &op1_1,
        &triple[2].try_value,
        &op1_2,
    )?;
    lin.target = target;
    let solutions = lin
        .solve_for_x()
        .filter(|s| in_range(s, 1))
        .into_iter()
        .collect();
    Some(LinearEquation { endian: Endian::Big, chunk_size: 1, linearity: lin, solutions })
}

/// Try every multi-byte chunk size/endian combination, returning the
/// first one whose assembled chunk values are exactly collinear with the
/// observed `operand1`s, targeting the branch's `operand2`.
fn find_chunked(ctx: &Context, triple: &[BranchInfo; 3]) -> Option<LinearEquation> {
    let target = raw_operands(&triple[0]).1;
    for &size in &CHUNK_SIZES {
        for &endian in &[Endian::Big, Endian::Little] {
            let chunks: Option<Vec<BigInt>> = triple
                .iter()
                .map(|b| concat_bytes(size, &b.try_value, ctx).map(|bytes| bytes_to_big_int(endian, false, &bytes)))
                .collect();
            let Some(xs) = chunks else { continue };
            let lin = fit_triple(
                &xs[0],
                &raw_operands(&triple[0]).0,
                &xs[1],
                &raw_operands(&triple[1]).0,
                &xs[2],
                &raw_operands(&triple[2]).0,
            );
            let Some(mut lin) = lin else { continue };
            lin.target = target.clone();
            let solutions = lin.solve_for_x().filter(|s| in_range(s, size)).into_iter().collect();
            return Some(LinearEquation { endian, chunk_size: size, linearity: lin, solutions });
        }
    }
    None
}

/// Infer a linear equation from three branch-info samples at the same
/// branch point, preferring the single-byte fit and falling back to
/// multi-byte chunk reassembly using the seed's neighbor-byte context.
pub fn find(ctx: &Context, triple: &[BranchInfo; 3]) -> Option<LinearEquation> {
    find_single_byte(triple).or_else(|| find_chunked(ctx, triple))
}

/// Encode a solved chunk value back into seed bytes, for the solver.
pub fn encode_solution(eq: &LinearEquation, value: &BigInt) -> Vec<u8> {
    big_int_to_bytes(eq.endian, eq.chunk_size, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use concolic_core::{CompareType, Direction};

    fn br(try_value: i64, operand1: u64, operand2: u64, distance: i64) -> BranchInfo {
        BranchInfo {
            inst_addr: 0x1000,
            branch_type: CompareType::Equality,
            try_value: BigInt::from(try_value),
            operand_size: 1,
            operand1,
            operand2,
            distance: BigInt::from(distance),
        }
    }

    #[test]
    fn scenario_1_linear_equation_detection() {
        // b = 2x, compared against 0x4a; samples x in {0x30, 0x35, 0x40}
        let triple = [
            br(0x30, 0x60, 0x4a, 0x60 - 0x4a),
            br(0x35, 0x6a, 0x4a, 0x6a - 0x4a),
            br(0x40, 0x80, 0x4a, 0x80 - 0x4a),
        ];
        let ctx = Context { neighbor_bytes: vec![0x30], byte_dir: Direction::Right };
        let eq = find(&ctx, &triple).expect("linear equation expected");
        assert_eq!(eq.chunk_size, 1);
        assert_eq!(eq.endian, Endian::Big);
        assert_eq!(eq.linearity.x0, BigInt::from(0x30));
        assert_eq!(eq.linearity.y0, BigInt::from(0x60));
        assert_eq!(eq.linearity.target, BigInt::from(0x4a));
        assert_eq!(eq.solutions, vec![BigInt::from(0x25)]);
    }

    #[test]
    fn rejects_non_collinear_triple() {
        // operand1 doesn't sit on any line through the other two samples.
        let triple = [br(1, 0, 0, 1), br(2, 1, 0, 4), br(3, 100, 0, 9)];
        let ctx = Context { neighbor_bytes: vec![1], byte_dir: Direction::Right };
        assert!(find(&ctx, &triple).is_none());
    }

    #[test]
    fn every_solution_satisfies_the_equation_and_fits_chunk_range() {
        // operand1 = 2 * try_value, compared against a constant 0x50.
        let triple = [
            br(0x10, 0x20, 0x50, 0),
            br(0x20, 0x40, 0x50, 0),
            br(0x30, 0x60, 0x50, 0),
        ];
        let ctx = Context { neighbor_bytes: vec![0x10], byte_dir: Direction::Right };
        let eq = find(&ctx, &triple).unwrap();
        assert!(!eq.solutions.is_empty());
        for s in &eq.solutions {
            assert!(in_range(s, eq.chunk_size));
            assert!(eq.linearity.fits(s, &eq.linearity.target));
        }
    }
}
