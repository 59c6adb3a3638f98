//! Unsigned big-endian octet I/O for multi-precision integers.
//!
//! The standards this crate implements fix field widths in several places —
//! an EC coordinate is always `ceil(bits(curve)/8)` octets, an ECDSA
//! signature component likewise — and fixing the width is part of
//! interoperability, not an implementation convenience. `to_octets` and
//! `from_octets` are the two primitives everything else (JWK parameter
//! encode/decode, ECDSA signature assembly) is built on.

use crate::error::{Error, Result};

/// Interprets `octets` as an unsigned big-endian integer and returns the
/// minimal-length big-endian encoding (no leading zero octets, except a
/// single `0x00` for the value zero).
#[must_use]
pub fn to_minimal_octets(octets: &[u8]) -> Vec<u8> {
    let first_nonzero = octets.iter().position(|&b| b != 0);
    match first_nonzero {
        Some(index) => octets[index..].to_vec(),
        None => vec![0],
    }
}

/// Encodes `octets` (an unsigned big-endian integer, in minimal or
/// non-minimal form) into exactly `target_len` big-endian octets,
/// left-padding with zeroes as needed.
///
/// Fails with [`Error::IntegerTooLarge`] if the minimal representation does
/// not fit in `target_len` octets.
pub fn to_fixed_width(octets: &[u8], target_len: usize) -> Result<Vec<u8>> {
    let minimal = to_minimal_octets(octets);
    let significant_len = if minimal == [0] { 0 } else { minimal.len() };
    if significant_len > target_len {
        return Err(Error::IntegerTooLarge);
    }
    let mut out = vec![0u8; target_len];
    if significant_len > 0 {
        out[target_len - significant_len..].copy_from_slice(&minimal);
    }
    Ok(out)
}

/// Number of octets needed to hold a curve coordinate or signature
/// component for a curve of the given bit size, i.e. `ceil(bits / 8)`.
#[must_use]
pub const fn octet_len_for_bits(bits: usize) -> usize {
    bits.div_ceil(8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_strips_leading_zeroes() {
        assert_eq!(to_minimal_octets(&[0, 0, 1, 2]), vec![1, 2]);
        assert_eq!(to_minimal_octets(&[0, 0, 0]), vec![0]);
        assert_eq!(to_minimal_octets(&[1, 2, 3]), vec![1, 2, 3]);
    }

    #[test]
    fn fixed_width_pads_left() {
        assert_eq!(to_fixed_width(&[1, 2], 4).unwrap(), vec![0, 0, 1, 2]);
        assert_eq!(to_fixed_width(&[0], 3).unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn fixed_width_rejects_overflow() {
        assert!(matches!(
            to_fixed_width(&[1, 2, 3], 2),
            Err(Error::IntegerTooLarge)
        ));
    }

    #[test]
    fn curve_octet_lengths() {
        assert_eq!(octet_len_for_bits(256), 32);
        assert_eq!(octet_len_for_bits(384), 48);
        assert_eq!(octet_len_for_bits(521), 66);
    }
}
