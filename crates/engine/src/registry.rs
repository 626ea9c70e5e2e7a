//! Non-fungible asset registry with provenance metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::Address;

/// Immutable provenance record bound to an asset at mint time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub asset_type: String,
    pub quantity: u64,
    pub location: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRegistry {
    address: Address,
    next_id: u64,
    owners: BTreeMap<u64, Address>,
    approvals: BTreeMap<u64, Address>,
    metadata: BTreeMap<u64, AssetMetadata>,
}

impl AssetRegistry {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            next_id: 0,
            owners: BTreeMap::new(),
            approvals: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Issue a new asset. Ids are sequential starting at zero.
    pub fn mint(
        &mut self,
        to: &Address,
        asset_type: impl Into<String>,
        quantity: u64,
        location: impl Into<String>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.owners.insert(id, *to);
        self.metadata.insert(
            id,
            AssetMetadata {
                asset_type: asset_type.into(),
                quantity,
                location: location.into(),
            },
        );
        id
    }

    pub fn owner_of(&self, id: u64) -> Result<Address> {
        self.owners
            .get(&id)
            .copied()
            .ok_or(EngineError::UnknownAsset(id))
    }

    pub fn metadata_of(&self, id: u64) -> Result<&AssetMetadata> {
        self.metadata.get(&id).ok_or(EngineError::UnknownAsset(id))
    }

    pub fn approved_for(&self, id: u64) -> Option<Address> {
        self.approvals.get(&id).copied()
    }

    /// Approve one operator to pull the asset. Owner only.
    pub fn approve(&mut self, caller: &Address, operator: Address, id: u64) -> Result<()> {
        let owner = self.owner_of(id)?;
        if *caller != owner {
            return Err(EngineError::NotAuthorized);
        }
        self.approvals.insert(id, operator);
        Ok(())
    }

    /// Move the asset from its owner. Caller must be the owner or the
    /// approved operator; any approval is cleared by the move.
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        id: u64,
    ) -> Result<()> {
        let owner = self.owner_of(id)?;
        if owner != *from {
            return Err(EngineError::NotAuthorized);
        }
        let approved = self.approved_for(id);
        if *caller != owner && approved != Some(*caller) {
            return Err(EngineError::NotAuthorized);
        }
        self.approvals.remove(&id);
        self.owners.insert(id, *to);
        Ok(())
    }
}
