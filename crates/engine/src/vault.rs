//! Overcollateralized stablecoin vault.
//!
//! Positions are keyed by depositor and mutated by three operations:
//! deposit-and-mint, repay-and-withdraw, and liquidation. Mint and withdraw
//! share the same 150% health bar; liquidation opens at 110%. Every
//! operation validates the prospective position before committing, so a
//! rejected call leaves the ledger and the position exactly as it found them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::CallContext;
use crate::error::{EngineError, Result};
use crate::math::{mul_div, PRECISION};
use crate::oracle::{normalize_price, PriceSource};
use crate::stable::StableAsset;
use crate::Address;

/// Minimum health after a mint or withdrawal (150%).
pub const MINT_THRESHOLD: u128 = 1_500_000_000_000_000_000;

/// Health at or below which a position can be liquidated (110%).
pub const LIQUIDATION_THRESHOLD: u128 = 1_100_000_000_000_000_000;

/// Collateral value seized per unit of repaid debt (105%).
pub const LIQUIDATION_BONUS: u128 = 1_050_000_000_000_000_000;

/// One depositor's collateral/debt position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Native collateral, smallest unit
    pub collateral: u128,
    /// Stable-asset debt, smallest unit
    pub debt: u128,
}

/// Record of a completed liquidation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiquidationReceipt {
    pub liquidator: Address,
    pub debtor: Address,
    pub repaid: u128,
    pub seized: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralVault {
    address: Address,
    positions: BTreeMap<Address, Position>,
    total_collateral: u128,
}

/// Health of a position at the given 18-decimal price.
///
/// `collateral_value * PRECISION / debt`, flooring at each division. A
/// debt-free position has no liquidation risk and reports `u128::MAX`.
pub fn health_factor(position: &Position, price: u128) -> Result<u128> {
    if position.debt == 0 {
        return Ok(u128::MAX);
    }
    let collateral_value = mul_div(position.collateral, price, PRECISION)?;
    mul_div(collateral_value, PRECISION, position.debt)
}

impl CollateralVault {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            positions: BTreeMap::new(),
            total_collateral: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Position for `who`; zero/zero if none exists yet.
    pub fn position(&self, who: &Address) -> Position {
        self.positions.get(who).copied().unwrap_or_default()
    }

    pub fn positions(&self) -> impl Iterator<Item = (&Address, &Position)> {
        self.positions.iter()
    }

    /// Native collateral held across all positions.
    pub fn total_collateral(&self) -> u128 {
        self.total_collateral
    }

    /// Accept `ctx.value` of native collateral and mint `mint_amount` of the
    /// stable asset to the caller.
    pub fn deposit_and_mint(
        &mut self,
        stable: &mut StableAsset,
        oracle: &dyn PriceSource,
        ctx: &CallContext,
        mint_amount: u128,
    ) -> Result<()> {
        let price = normalize_price(oracle)?;
        let position = self.position(&ctx.sender);

        let next = Position {
            collateral: position
                .collateral
                .checked_add(ctx.value)
                .ok_or(EngineError::Overflow)?,
            debt: position
                .debt
                .checked_add(mint_amount)
                .ok_or(EngineError::Overflow)?,
        };
        if health_factor(&next, price)? < MINT_THRESHOLD {
            return Err(EngineError::VaultHealthTooLow);
        }
        let total = self
            .total_collateral
            .checked_add(ctx.value)
            .ok_or(EngineError::Overflow)?;

        stable.mint(&self.address, &ctx.sender, mint_amount)?;
        self.positions.insert(ctx.sender, next);
        self.total_collateral = total;
        log::debug!(
            "vault: deposit {} mint {} (debt {} collateral {})",
            ctx.value,
            mint_amount,
            next.debt,
            next.collateral
        );
        Ok(())
    }

    /// Burn `repay` of the caller's stable debt and release `withdraw` of
    /// collateral. Returns the withdrawn amount for the runtime to pay out.
    ///
    /// The burn spends the allowance the caller granted the vault.
    pub fn repay_and_withdraw(
        &mut self,
        stable: &mut StableAsset,
        oracle: &dyn PriceSource,
        ctx: &CallContext,
        repay: u128,
        withdraw: u128,
    ) -> Result<u128> {
        let price = normalize_price(oracle)?;
        let position = self.position(&ctx.sender);

        let next = Position {
            collateral: position
                .collateral
                .checked_sub(withdraw)
                .ok_or(EngineError::InsufficientCollateral)?,
            debt: position
                .debt
                .checked_sub(repay)
                .ok_or(EngineError::RepayExceedsDebt)?,
        };
        if health_factor(&next, price)? < MINT_THRESHOLD {
            return Err(EngineError::VaultHealthTooLow);
        }

        if repay > 0 {
            stable.burn_from(&self.address, &ctx.sender, repay)?;
        }
        self.positions.insert(ctx.sender, next);
        self.total_collateral -= withdraw;
        log::debug!(
            "vault: repay {} withdraw {} (debt {} collateral {})",
            repay,
            withdraw,
            next.debt,
            next.collateral
        );
        Ok(withdraw)
    }

    /// Close out an unhealthy position. Callable by anyone.
    ///
    /// The caller pays the debtor's full outstanding debt (burned from the
    /// caller against their allowance to the vault) and seizes collateral
    /// worth `debt * LIQUIDATION_BONUS` at the current price. The remainder
    /// stays with the debtor. Returns the seizure receipt; the runtime pays
    /// the seized collateral out to the liquidator.
    pub fn liquidate(
        &mut self,
        stable: &mut StableAsset,
        oracle: &dyn PriceSource,
        ctx: &CallContext,
        debtor: &Address,
    ) -> Result<LiquidationReceipt> {
        let price = normalize_price(oracle)?;
        let position = self.position(debtor);

        if health_factor(&position, price)? > LIQUIDATION_THRESHOLD {
            return Err(EngineError::VaultNotLiquidatable);
        }

        let seize_value = mul_div(position.debt, LIQUIDATION_BONUS, PRECISION)?;
        let seized = mul_div(seize_value, PRECISION, price)?;
        let remaining = position
            .collateral
            .checked_sub(seized)
            .ok_or(EngineError::InsufficientCollateral)?;

        stable.burn_from(&self.address, &ctx.sender, position.debt)?;
        self.positions.insert(
            *debtor,
            Position {
                collateral: remaining,
                debt: 0,
            },
        );
        self.total_collateral -= seized;

        let receipt = LiquidationReceipt {
            liquidator: ctx.sender,
            debtor: *debtor,
            repaid: position.debt,
            seized,
        };
        log::info!(
            "vault: liquidated debt {} seizing {} collateral",
            receipt.repaid,
            receipt.seized
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::FixedPriceSource;

    const DEPLOYER: Address = [1u8; 32];
    const VAULT: Address = [2u8; 32];
    const TOKEN: Address = [3u8; 32];
    const BOB: Address = [4u8; 32];

    const ONE: u128 = PRECISION;

    fn setup() -> (CollateralVault, StableAsset, FixedPriceSource) {
        let mut stable = StableAsset::new(TOKEN, DEPLOYER);
        stable.transfer_minter(&DEPLOYER, VAULT).unwrap();
        let vault = CollateralVault::new(VAULT);
        // $2000 with 8 decimals
        let price = FixedPriceSource::new(2_000_00000000, 8);
        (vault, stable, price)
    }

    #[test]
    fn health_is_unbounded_without_debt() {
        let position = Position {
            collateral: ONE,
            debt: 0,
        };
        assert_eq!(health_factor(&position, 2_000 * ONE).unwrap(), u128::MAX);
    }

    #[test]
    fn deposit_and_mint_tracks_position_and_supply() {
        let (mut vault, mut stable, price) = setup();
        let ctx = CallContext::with_value(BOB, 0, ONE);
        vault
            .deposit_and_mint(&mut stable, &price, &ctx, 1_000 * ONE)
            .unwrap();

        let position = vault.position(&BOB);
        assert_eq!(position.collateral, ONE);
        assert_eq!(position.debt, 1_000 * ONE);
        assert_eq!(stable.balance_of(&BOB), 1_000 * ONE);
        assert_eq!(vault.total_collateral(), ONE);
    }

    #[test]
    fn mint_past_threshold_leaves_no_trace() {
        let (mut vault, mut stable, price) = setup();
        let ctx = CallContext::with_value(BOB, 0, ONE);
        let result = vault.deposit_and_mint(&mut stable, &price, &ctx, 1_400 * ONE);
        assert_eq!(result, Err(EngineError::VaultHealthTooLow));
        assert_eq!(vault.position(&BOB), Position::default());
        assert_eq!(stable.balance_of(&BOB), 0);
        assert_eq!(vault.total_collateral(), 0);
    }

    #[test]
    fn pure_withdrawal_respects_the_mint_bar() {
        let (mut vault, mut stable, price) = setup();
        let ctx = CallContext::with_value(BOB, 0, ONE);
        vault
            .deposit_and_mint(&mut stable, &price, &ctx, 1_000 * ONE)
            .unwrap();

        let ctx = CallContext::new(BOB, 0);
        // 0.3 ETH out leaves $1400 against $1000 debt: 140% < 150%
        assert_eq!(
            vault.repay_and_withdraw(&mut stable, &price, &ctx, 0, 3 * ONE / 10),
            Err(EngineError::VaultHealthTooLow)
        );
        // 0.1 ETH out leaves 180%
        let withdrawn = vault
            .repay_and_withdraw(&mut stable, &price, &ctx, 0, ONE / 10)
            .unwrap();
        assert_eq!(withdrawn, ONE / 10);
        assert_eq!(vault.position(&BOB).collateral, 9 * ONE / 10);
    }

    #[test]
    fn repay_more_than_debt_is_rejected() {
        let (mut vault, mut stable, price) = setup();
        let ctx = CallContext::with_value(BOB, 0, ONE);
        vault
            .deposit_and_mint(&mut stable, &price, &ctx, 100 * ONE)
            .unwrap();

        let ctx = CallContext::new(BOB, 0);
        assert_eq!(
            vault.repay_and_withdraw(&mut stable, &price, &ctx, 101 * ONE, 0),
            Err(EngineError::RepayExceedsDebt)
        );
    }

    #[test]
    fn liquidation_needs_the_threshold() {
        let (mut vault, mut stable, mut price) = setup();
        let ctx = CallContext::with_value(BOB, 0, ONE);
        vault
            .deposit_and_mint(&mut stable, &price, &ctx, 1_000 * ONE)
            .unwrap();

        let liquidator = [9u8; 32];
        let ctx = CallContext::new(liquidator, 0);
        assert_eq!(
            vault.liquidate(&mut stable, &price, &ctx, &BOB),
            Err(EngineError::VaultNotLiquidatable)
        );

        // $1111 keeps health just above 110%
        price.set_answer(1_111_00000000);
        assert_eq!(
            vault.liquidate(&mut stable, &price, &ctx, &BOB),
            Err(EngineError::VaultNotLiquidatable)
        );
    }

    #[test]
    fn liquidation_seizes_the_exact_bonus_amount() {
        let (mut vault, mut stable, mut price) = setup();
        let ctx = CallContext::with_value(BOB, 0, ONE);
        vault
            .deposit_and_mint(&mut stable, &price, &ctx, 1_000 * ONE)
            .unwrap();

        // price drop to $1100 puts health exactly at the 110% threshold
        price.set_answer(1_100_00000000);
        let position = vault.position(&BOB);
        assert_eq!(
            health_factor(&position, 1_100 * ONE).unwrap(),
            LIQUIDATION_THRESHOLD
        );

        let liquidator = [9u8; 32];
        stable.mint(&VAULT, &liquidator, 1_000 * ONE).unwrap();
        stable.approve(&liquidator, &VAULT, 1_000 * ONE);

        let ctx = CallContext::new(liquidator, 0);
        let receipt = vault.liquidate(&mut stable, &price, &ctx, &BOB).unwrap();

        assert_eq!(receipt.repaid, 1_000 * ONE);
        assert_eq!(receipt.seized, 954_545_454_545_454_545);

        let position = vault.position(&BOB);
        assert_eq!(position.debt, 0);
        assert_eq!(position.collateral, 45_454_545_454_545_455);
        assert_eq!(stable.balance_of(&liquidator), 0);
    }

    #[test]
    fn zero_debt_positions_never_liquidate() {
        let (mut vault, mut stable, price) = setup();
        let ctx = CallContext::with_value(BOB, 0, ONE);
        vault.deposit_and_mint(&mut stable, &price, &ctx, 0).unwrap();

        let ctx = CallContext::new([9u8; 32], 0);
        assert_eq!(
            vault.liquidate(&mut stable, &price, &ctx, &BOB),
            Err(EngineError::VaultNotLiquidatable)
        );
    }

    #[test]
    fn failed_liquidation_burn_leaves_no_trace() {
        let (mut vault, mut stable, mut price) = setup();
        let ctx = CallContext::with_value(BOB, 0, ONE);
        vault
            .deposit_and_mint(&mut stable, &price, &ctx, 1_000 * ONE)
            .unwrap();
        price.set_answer(1_100_00000000);

        // liquidator has no stable balance or allowance
        let liquidator = [9u8; 32];
        let ctx = CallContext::new(liquidator, 0);
        let before = vault.position(&BOB);
        assert!(vault.liquidate(&mut stable, &price, &ctx, &BOB).is_err());
        assert_eq!(vault.position(&BOB), before);
        assert_eq!(vault.total_collateral(), ONE);
    }
}
