//! Fixed-point math utilities.
//!
//! All ratios in the engine are 18-decimal fixed point. Division truncates
//! toward zero; the exact truncation points are part of the observable
//! behavior (liquidation seizure amounts are asserted to the wei in tests).

use primitive_types::U256;

use crate::error::{EngineError, Result};

/// 18-decimal fixed-point scale.
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Basis-point scale for fees.
pub const BPS_SCALE: u128 = 10_000;

/// Compute `a * b / denom` with a 256-bit intermediate, flooring.
pub fn mul_div(a: u128, b: u128, denom: u128) -> Result<u128> {
    if denom == 0 {
        return Err(EngineError::Overflow);
    }
    let wide = U256::from(a) * U256::from(b) / U256::from(denom);
    if wide > U256::from(u128::MAX) {
        return Err(EngineError::Overflow);
    }
    Ok(wide.low_u128())
}

/// Fee in token units for an amount at `bps` basis points.
pub fn fee_amount(amount: u128, bps: u16) -> Result<u128> {
    mul_div(amount, bps as u128, BPS_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_floors() {
        assert_eq!(mul_div(10, 10, 3).unwrap(), 33);
        assert_eq!(mul_div(7, 1, 2).unwrap(), 3);
    }

    #[test]
    fn mul_div_survives_wide_intermediates() {
        // 1050e18 * 1e18 / 1100e18 overflows u128 in the intermediate
        // product; the result is the exact seizure vector from the vault.
        let usd = 1_050 * PRECISION;
        let price = 1_100 * PRECISION;
        assert_eq!(mul_div(usd, PRECISION, price).unwrap(), 954_545_454_545_454_545);
    }

    #[test]
    fn mul_div_rejects_zero_denominator() {
        assert_eq!(mul_div(1, 1, 0), Err(EngineError::Overflow));
    }

    #[test]
    fn fee_basis_points() {
        // 2.5% of 500 tokens
        assert_eq!(fee_amount(500 * PRECISION, 250).unwrap(), 125 * PRECISION / 10);
        assert_eq!(fee_amount(1_000, 0).unwrap(), 0);
    }
}
