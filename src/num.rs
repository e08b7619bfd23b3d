//! Float/integer conversions shared by quote weighting and probe sizing.
//!
//! Amounts live in `U256`; edge weights and probe scaling live in `f64`.
//! Both directions are lossy above 2^53 and that is acceptable: weights only
//! feed relative comparisons, and probe sizes are economic approximations.

use alloy_primitives::U256;

/// Lossy widening of a 256-bit amount into a double.
pub(crate) fn u256_to_f64(x: U256) -> f64 {
    x.as_limbs()
        .iter()
        .rev()
        .fold(0.0, |acc, &limb| acc * 2f64.powi(64) + limb as f64)
}

/// Lossy narrowing of a non-negative double into a 256-bit amount.
/// Non-finite or non-positive inputs map to zero.
pub(crate) fn f64_to_u256(v: f64) -> U256 {
    if !v.is_finite() || v <= 0.0 {
        return U256::ZERO;
    }
    if v < u128::MAX as f64 {
        return U256::from(v as u128);
    }
    let hi = (v / 2f64.powi(64)).floor();
    let lo = (v - hi * 2f64.powi(64)).max(0.0);
    (U256::from(hi as u128) << 64) | U256::from(lo as u128)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u256_to_f64_small_values() {
        assert_eq!(u256_to_f64(U256::ZERO), 0.0);
        assert_eq!(u256_to_f64(U256::from(1u64)), 1.0);
        assert_eq!(u256_to_f64(U256::from(1_000_000u64)), 1e6);
    }

    #[test]
    fn test_u256_to_f64_large_values() {
        // 1e18 is exactly representable as f64? No, but close enough.
        let wei = U256::from(10u64).pow(U256::from(18u64));
        let approx = u256_to_f64(wei);
        assert!((approx - 1e18).abs() / 1e18 < 1e-9);
    }

    #[test]
    fn test_f64_to_u256_round_trip() {
        for v in [0.0, 1.0, 100.0, 1e18, 1e30] {
            let back = u256_to_f64(f64_to_u256(v));
            if v == 0.0 {
                assert_eq!(back, 0.0);
            } else {
                assert!((back - v).abs() / v < 1e-9, "v={v} back={back}");
            }
        }
    }

    #[test]
    fn test_f64_to_u256_degenerate_inputs() {
        assert_eq!(f64_to_u256(-1.0), U256::ZERO);
        assert_eq!(f64_to_u256(f64::NAN), U256::ZERO);
        assert_eq!(f64_to_u256(f64::INFINITY), U256::ZERO);
    }
}
