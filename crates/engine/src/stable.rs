//! Fungible stable-asset ledger.
//!
//! Mint and burn are gated behind a single minter capability. The capability
//! is handed off exactly once (deployer to vault); after that hand-off the
//! ledger has one writer for supply changes for its whole lifetime.
//!
//! Escrow agents never receive pushed funds: they pull via the allowance
//! pattern (`approve` then `transfer_from` / `burn_from`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::Address;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StableAsset {
    address: Address,
    minter: Address,
    minter_transferred: bool,
    total_supply: u128,
    balances: BTreeMap<Address, u128>,
    allowances: BTreeMap<(Address, Address), u128>,
}

impl StableAsset {
    pub fn new(address: Address, minter: Address) -> Self {
        Self {
            address,
            minter,
            minter_transferred: false,
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn minter(&self) -> Address {
        self.minter
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn balance_of(&self, who: &Address) -> u128 {
        self.balances.get(who).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Hand the minter capability off. Allowed exactly once.
    pub fn transfer_minter(&mut self, caller: &Address, new_minter: Address) -> Result<()> {
        if *caller != self.minter {
            return Err(EngineError::NotMinter);
        }
        if self.minter_transferred {
            return Err(EngineError::MinterAlreadyTransferred);
        }
        self.minter = new_minter;
        self.minter_transferred = true;
        Ok(())
    }

    pub fn mint(&mut self, caller: &Address, to: &Address, amount: u128) -> Result<()> {
        if *caller != self.minter {
            return Err(EngineError::NotMinter);
        }
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(EngineError::Overflow)?;
        self.credit(to, amount)?;
        self.total_supply = supply;
        Ok(())
    }

    /// Burn from `from`, spending the allowance `from` granted the minter.
    pub fn burn_from(&mut self, caller: &Address, from: &Address, amount: u128) -> Result<()> {
        if *caller != self.minter {
            return Err(EngineError::NotMinter);
        }
        if self.balance_of(from) < amount {
            return Err(EngineError::InsufficientBalance);
        }
        if self.allowance(from, caller) < amount {
            return Err(EngineError::InsufficientAllowance);
        }
        self.spend_allowance(from, caller, amount);
        self.debit(from, amount);
        self.total_supply -= amount;
        Ok(())
    }

    pub fn transfer(&mut self, caller: &Address, to: &Address, amount: u128) -> Result<()> {
        if self.balance_of(caller) < amount {
            return Err(EngineError::InsufficientBalance);
        }
        self.debit(caller, amount);
        self.credit(to, amount)?;
        Ok(())
    }

    pub fn approve(&mut self, caller: &Address, spender: &Address, amount: u128) {
        self.allowances.insert((*caller, *spender), amount);
    }

    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<()> {
        if self.balance_of(from) < amount {
            return Err(EngineError::InsufficientBalance);
        }
        if self.allowance(from, caller) < amount {
            return Err(EngineError::InsufficientAllowance);
        }
        self.spend_allowance(from, caller, amount);
        self.debit(from, amount);
        self.credit(to, amount)?;
        Ok(())
    }

    fn debit(&mut self, who: &Address, amount: u128) {
        if amount == 0 {
            return;
        }
        let balance = self.balances.entry(*who).or_insert(0);
        *balance -= amount;
    }

    fn credit(&mut self, who: &Address, amount: u128) -> Result<()> {
        let balance = self.balances.entry(*who).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(EngineError::Overflow)?;
        Ok(())
    }

    fn spend_allowance(&mut self, owner: &Address, spender: &Address, amount: u128) {
        if let Some(remaining) = self.allowances.get_mut(&(*owner, *spender)) {
            *remaining -= amount;
        }
    }
}
