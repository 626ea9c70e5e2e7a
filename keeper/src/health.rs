//! Health calculation over vault positions.

use graze_engine::vault::{health_factor, CollateralVault, Position};
use graze_engine::{Address, LIQUIDATION_THRESHOLD, PRECISION};

/// A position eligible for liquidation right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidationCandidate {
    pub owner: Address,
    /// Raw health factor, 18-decimal fixed point
    pub health: u128,
    pub debt: u128,
    pub collateral: u128,
}

/// Health of a position relative to the liquidation gate.
///
/// 1.0 means exactly at the gate; below 1.0 the position is seizable. This
/// is the display form; the engine's own checks use the raw factor.
pub fn normalized_health(position: &Position, price: u128) -> Option<u128> {
    let health = health_factor(position, price).ok()?;
    if health == u128::MAX {
        return Some(u128::MAX);
    }
    health.checked_mul(PRECISION)?.checked_div(LIQUIDATION_THRESHOLD)
}

/// Every position at or below the liquidation threshold, worst-first.
///
/// Positions whose health cannot be computed at this price are skipped and
/// logged; they need operator attention, not a liquidation attempt.
pub fn scan_positions(vault: &CollateralVault, price: u128) -> Vec<LiquidationCandidate> {
    let mut candidates: Vec<LiquidationCandidate> = vault
        .positions()
        .filter(|(_, position)| position.debt > 0)
        .filter_map(|(owner, position)| match health_factor(position, price) {
            Ok(health) if health <= LIQUIDATION_THRESHOLD => Some(LiquidationCandidate {
                owner: *owner,
                health,
                debt: position.debt,
                collateral: position.collateral,
            }),
            Ok(_) => None,
            Err(err) => {
                log::warn!("keeper: skipping position with unscannable health: {err}");
                None
            }
        })
        .collect();
    candidates.sort_by_key(|candidate| candidate.health);
    candidates
}
