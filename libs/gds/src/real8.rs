//! The GDSII eight-byte real.
//!
//! Bit 63 is the sign, bits 62..56 hold a base-16 exponent in excess-64 notation,
//! and bits 55..0 hold the mantissa, so a value is `±0.m × 16^(e - 64)`.

use crate::error::{GdsError, GdsResult};

const SIGN: u64 = 1 << 63;
const DBL_MANTISSA: u32 = 52;
const GDS_MANTISSA: u32 = 56;
const GDS_EXP_MAX: i32 = 0x7f << 2;

/// Encodes `value` as a Real8.
///
/// Fails for NaN, infinities, and magnitudes outside the Real8 exponent range.
pub fn encode(value: f64) -> GdsResult<u64> {
    if value == 0.0 {
        return Ok(0);
    }
    let bits = value.to_bits();
    let biased = ((bits >> DBL_MANTISSA) & 0x7ff) as i32;
    // Subnormals are far below the smallest Real8.
    if biased == 0 || biased == 0x7ff {
        return Err(GdsError::Real8OutOfRange { value });
    }

    // `value = frac × 2^exp` with `0.5 <= |frac| < 1`.
    let mut exp = biased - 1022;
    let hidden = 1u64 << DBL_MANTISSA;
    let mut mantissa = (hidden | (bits & (hidden - 1))) << (GDS_MANTISSA - DBL_MANTISSA - 1);

    // Round the binary exponent up to a multiple of four.
    let shift = 4 - (exp & 3);
    mantissa >>= shift;
    exp += 256 + shift;
    if !(0..=GDS_EXP_MAX).contains(&exp) {
        return Err(GdsError::Real8OutOfRange { value });
    }

    Ok((bits & SIGN) | (((exp as u64) >> 2) << GDS_MANTISSA) | mantissa)
}

/// Decodes a Real8.
///
/// Mantissas need not be normalized.
pub fn decode(bits: u64) -> f64 {
    let mantissa = bits & ((1 << GDS_MANTISSA) - 1);
    if mantissa == 0 {
        return 0.0;
    }
    let exp = ((bits >> GDS_MANTISSA) & 0x7f) as i32 - 64;
    let magnitude = mantissa as f64 * pow2(4 * exp - GDS_MANTISSA as i32);
    if bits & SIGN != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// `2^k` for `k` in the normal exponent range, built directly from its bits.
fn pow2(k: i32) -> f64 {
    debug_assert!((-1022..=1023).contains(&k));
    f64::from_bits(((k + 1023) as u64) << DBL_MANTISSA)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_documented_vectors() {
        let cases: [(f64, u64); 11] = [
            (5e-4, 0x3e20c49ba5e353f8),
            (5e-10, 0x39225c17d04dad2a),
            (-5e-4, 0xbe20c49ba5e353f8),
            (-5e-10, 0xb9225c17d04dad2a),
            (0.0, 0x0000000000000000),
            (1.0, 0x4110000000000000),
            (10.0, 0x420a000000000000),
            (-3.0, 0xc130000000000000),
            (1e3, 0x433e800000000000),
            (1e5, 0x45186a0000000000),
            (-1e5, 0xc5186a0000000000),
        ];
        for (value, bits) in cases {
            assert_eq!(encode(value).unwrap(), bits, "encoding {value}");
            assert_eq!(decode(bits).to_bits(), value.to_bits(), "decoding {bits:#x}");
        }
    }

    #[test]
    fn round_trips_bit_exactly() {
        let values = [
            2.65732619e5,
            -2.65732619e5,
            13.7,
            1.6,
            1.0,
            0.0,
            0.1,
            1e-3,
            1.54e-5,
            1e-6,
            1e-9,
            -1.54e-5,
            -1e-6,
            -1e-9,
            90.0,
            180.0,
            270.0,
        ];
        for value in values {
            let decoded = decode(encode(value).unwrap());
            assert_eq!(decoded.to_bits(), value.to_bits(), "round trip of {value}");
        }
    }

    #[test]
    fn decodes_unnormalized_mantissa() {
        // 0x0.01 × 16^1
        assert_eq!(decode(0x4101000000000000), 1.0 / 16.0);
    }

    #[test]
    fn rejects_unrepresentable_values() {
        let values = [
            f64::NAN,
            f64::INFINITY,
            f64::NEG_INFINITY,
            1e300,
            1e-300,
            f64::MIN_POSITIVE / 2.0,
        ];
        for value in values {
            assert!(
                matches!(encode(value), Err(GdsError::Real8OutOfRange { .. })),
                "{value} should be rejected"
            );
        }
    }
}
