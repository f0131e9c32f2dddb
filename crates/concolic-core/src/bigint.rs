//! Arbitrary-precision integer helpers.
//!
//! Branch distances may reflect a 64-bit unsigned subtraction that
//! overflows a signed 64-bit range, so every distance and solved value is
//! carried as a [`num_bigint::BigInt`] rather than a fixed-width integer.
//! Rational slopes (see `concolic-infer::linearity`) keep numerator and
//! denominator separate for the same reason: collapsing to floating point
//! would silently round away exact integer roots.

use crate::typedef::Endian;
use num_bigint::{BigInt, Sign};

pub type Rational = num_rational::BigRational;

/// Interpret `size` bytes (in the given endianness) as a big integer. When
/// `signed` is set, the most significant bit is sign-extended.
pub fn bytes_to_big_int(endian: Endian, signed: bool, bytes: &[u8]) -> BigInt {
    let mut be: Vec<u8> = bytes.to_vec();
    if endian == Endian::Little {
        be.reverse();
    }
    if !signed || be.is_empty() || be[0] & 0x80 == 0 {
        BigInt::from_bytes_be(Sign::Plus, &be)
    } else {
        // Two's-complement negative: value = unsigned - 2^(8*len)
        let unsigned = BigInt::from_bytes_be(Sign::Plus, &be);
        let modulus = BigInt::from(1) << (8 * be.len());
        unsigned - modulus
    }
}

/// Encode a big integer back into exactly `size` bytes in the given
/// endianness, truncating to the low `size` bytes of its two's-complement
/// representation. Inverse of [`bytes_to_big_int`] whenever the value fits.
pub fn big_int_to_bytes(endian: Endian, size: usize, value: &BigInt) -> Vec<u8> {
    let modulus = BigInt::from(1) << (8 * size);
    let mut normalized = value % &modulus;
    if normalized.sign() == num_bigint::Sign::Minus {
        normalized += &modulus;
    }
    let (_, mut be) = normalized.to_bytes_be();
    if be.len() < size {
        let mut padded = vec![0u8; size - be.len()];
        padded.append(&mut be);
        be = padded;
    } else if be.len() > size {
        be = be[be.len() - size..].to_vec();
    }
    if endian == Endian::Little {
        be.reverse();
    }
    be
}

/// Interpret a native `u64` operand as a signed or unsigned `size`-byte
/// quantity. Mirrors the tracer's raw operand fields, which always arrive
/// zero-extended into a `u64` regardless of their true width.
pub fn interpret_operand(signed: bool, size: usize, raw: u64) -> BigInt {
    let bytes = raw.to_be_bytes();
    let narrowed = &bytes[8 - size..];
    bytes_to_big_int(Endian::Big, signed, narrowed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_all_sizes_and_endians() {
        for size in [1usize, 2, 4, 8] {
            for endian in [Endian::Little, Endian::Big] {
                let bytes: Vec<u8> = (0..size as u8).map(|i| i.wrapping_mul(37).wrapping_add(3)).collect();
                let v = bytes_to_big_int(endian, false, &bytes);
                let back = big_int_to_bytes(endian, size, &v);
                assert_eq!(back, bytes, "size={size:?} endian={endian:?}");
            }
        }
    }

    #[test]
    fn signed_high_bit_is_negative() {
        let v = bytes_to_big_int(Endian::Big, true, &[0xFF]);
        assert_eq!(v, BigInt::from(-1));
        let v = bytes_to_big_int(Endian::Big, false, &[0xFF]);
        assert_eq!(v, BigInt::from(255));
    }

    #[test]
    fn little_endian_reverses_byte_order() {
        let v = bytes_to_big_int(Endian::Little, false, &[0x01, 0x00]);
        assert_eq!(v, BigInt::from(1));
        let v = bytes_to_big_int(Endian::Big, false, &[0x01, 0x00]);
        assert_eq!(v, BigInt::from(256));
    }

    #[test]
    fn encode_wraps_negative_into_twos_complement() {
        let bytes = big_int_to_bytes(Endian::Big, 1, &BigInt::from(-1));
        assert_eq!(bytes, vec![0xFF]);
    }
}
