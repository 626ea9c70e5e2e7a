//! In-memory composition of the engine components.
//!
//! `World` plays the part of the chain runtime for local callers (CLI,
//! integration tests): it owns every ledger, keeps the native-currency
//! balances that live outside the engine proper, and routes the native value
//! that vault operations attach or release. Auction and token operations are
//! invoked directly on the fields; only the native-moving paths need to go
//! through `World`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::auction::{AuctionHouse, AuctionParams};
use crate::context::CallContext;
use crate::error::{EngineError, Result};
use crate::oracle::FixedPriceSource;
use crate::registry::AssetRegistry;
use crate::stable::StableAsset;
use crate::vault::{CollateralVault, LiquidationReceipt};
use crate::Address;

/// Deterministic address for a system component.
pub fn system_address(tag: &str) -> Address {
    let mut address = [0u8; 32];
    let bytes = tag.as_bytes();
    let n = bytes.len().min(32);
    address[..n].copy_from_slice(&bytes[..n]);
    address
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    /// Logical clock (seconds); advanced by the embedding caller
    pub clock: u64,
    pub price: FixedPriceSource,
    pub stable: StableAsset,
    pub assets: AssetRegistry,
    pub vault: CollateralVault,
    pub auctions: AuctionHouse,
    native: BTreeMap<Address, u128>,
}

impl World {
    /// Stand the system up: deploy the ledgers, then hand the stable-asset
    /// minter capability to the vault, exactly once.
    pub fn new(admin: Address, price: FixedPriceSource, params: AuctionParams) -> Result<Self> {
        let stable_addr = system_address("graze/stable");
        let vault_addr = system_address("graze/vault");

        let mut stable = StableAsset::new(stable_addr, admin);
        stable.transfer_minter(&admin, vault_addr)?;

        Ok(Self {
            clock: 0,
            price,
            stable,
            assets: AssetRegistry::new(system_address("graze/assets")),
            vault: CollateralVault::new(vault_addr),
            auctions: AuctionHouse::new(system_address("graze/auctions"), params),
            native: BTreeMap::new(),
        })
    }

    pub fn advance(&mut self, seconds: u64) {
        self.clock += seconds;
    }

    pub fn ctx(&self, sender: Address) -> CallContext {
        CallContext::new(sender, self.clock)
    }

    pub fn native_balance(&self, who: &Address) -> u128 {
        self.native.get(who).copied().unwrap_or(0)
    }

    /// Faucet for local operation.
    pub fn fund_native(&mut self, who: &Address, amount: u128) {
        *self.native.entry(*who).or_insert(0) += amount;
    }

    /// Deposit `value` native collateral and mint `mint_amount` stable.
    pub fn deposit_and_mint(
        &mut self,
        sender: Address,
        value: u128,
        mint_amount: u128,
    ) -> Result<()> {
        if self.native_balance(&sender) < value {
            return Err(EngineError::InsufficientBalance);
        }
        let ctx = CallContext::with_value(sender, self.clock, value);
        self.vault
            .deposit_and_mint(&mut self.stable, &self.price, &ctx, mint_amount)?;
        self.move_native(&sender, &self.vault.address(), value);
        Ok(())
    }

    /// Repay stable debt and withdraw native collateral to the caller.
    pub fn repay_and_withdraw(
        &mut self,
        sender: Address,
        repay: u128,
        withdraw: u128,
    ) -> Result<u128> {
        let ctx = CallContext::new(sender, self.clock);
        let out = self
            .vault
            .repay_and_withdraw(&mut self.stable, &self.price, &ctx, repay, withdraw)?;
        self.move_native(&self.vault.address(), &sender, out);
        Ok(out)
    }

    /// Liquidate `debtor`, paying the seized collateral out to the caller.
    pub fn liquidate(&mut self, sender: Address, debtor: &Address) -> Result<LiquidationReceipt> {
        let ctx = CallContext::new(sender, self.clock);
        let receipt = self
            .vault
            .liquidate(&mut self.stable, &self.price, &ctx, debtor)?;
        self.move_native(&self.vault.address(), &sender, receipt.seized);
        Ok(receipt)
    }

    fn move_native(&mut self, from: &Address, to: &Address, amount: u128) {
        if amount == 0 {
            return;
        }
        let balance = self.native.entry(*from).or_insert(0);
        *balance = balance.saturating_sub(amount);
        *self.native.entry(*to).or_insert(0) += amount;
    }
}
