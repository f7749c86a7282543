//! Half-float codec.
//!
//! Bit-level conversion between 16-bit and 32-bit IEEE 754 values. Half
//! properties are materialized as `f32` and narrowed again on write, so every
//! finite half bit pattern survives a decode/encode cycle unchanged.
//!
//! Narrowing rounds to nearest-even. Values beyond the half range become
//! infinity, values below the smallest subnormal become signed zero. NaN keeps
//! its sign and is forced quiet.

use ::half::f16;

/// Widen a half bit pattern to `f32`.
#[inline]
pub fn half_to_float(bits: u16) -> f32 {
    f16::from_bits(bits).to_f32()
}

/// Narrow an `f32` to a half bit pattern.
#[inline]
pub fn float_to_half(value: f32) -> u16 {
    f16::from_f32(value).to_bits()
}

/// Round an `f32` through half precision.
#[inline]
pub fn quantize_half(value: f32) -> f32 {
    half_to_float(float_to_half(value))
}

/// Widen a run of half bit patterns.
pub fn halves_to_floats(src: &[u16]) -> Vec<f32> {
    src.iter().map(|&h| half_to_float(h)).collect()
}

/// Narrow a run of floats to half bit patterns.
pub fn floats_to_halves(src: &[f32]) -> Vec<u16> {
    src.iter().map(|&f| float_to_half(f)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert_eq!(half_to_float(0x3c00), 1.0);
        assert_eq!(half_to_float(0xc000), -2.0);
        assert_eq!(half_to_float(0x7bff), 65504.0);
        assert_eq!(float_to_half(1.0), 0x3c00);
        assert_eq!(float_to_half(0.5), 0x3800);
        assert_eq!(float_to_half(-0.0), 0x8000);
    }

    #[test]
    fn test_every_finite_pattern_round_trips() {
        for bits in 0..=u16::MAX {
            let exponent = (bits >> 10) & 0x1f;
            if exponent == 0x1f {
                continue;
            }
            assert_eq!(float_to_half(half_to_float(bits)), bits, "pattern {bits:#06x}");
        }
    }

    #[test]
    fn test_infinities_and_nan() {
        assert_eq!(float_to_half(f32::INFINITY), 0x7c00);
        assert_eq!(float_to_half(f32::NEG_INFINITY), 0xfc00);
        assert_eq!(float_to_half(1.0e6), 0x7c00);
        assert!(half_to_float(0x7e00).is_nan());
        assert!(half_to_float(float_to_half(f32::NAN)).is_nan());
    }

    #[test]
    fn test_underflow_is_deterministic() {
        assert_eq!(float_to_half(1.0e-10), 0x0000);
        assert_eq!(float_to_half(-1.0e-10), 0x8000);
        assert_eq!(quantize_half(1.0e-10), 0.0);
    }
}
