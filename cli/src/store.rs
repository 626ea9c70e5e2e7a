//! State file handling.

use std::path::Path;

use anyhow::{Context, Result};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use graze_authority::{AuthorityVerifier, DecryptionAuthority, MockFhe};
use graze_engine::{AuctionParams, FixedPriceSource, World};

use crate::account::{parse_account, parse_scaled};
use crate::config::CliConfig;

/// Everything a command needs, persisted between invocations.
#[derive(Serialize, Deserialize)]
pub struct AppState {
    pub world: World,
    pub fhe: MockFhe,
    authority_seed: [u8; 32],
}

impl AppState {
    pub fn init(config: &CliConfig) -> Result<Self> {
        let admin = parse_account("deployer");
        let answer = parse_scaled(&config.oracle_price, config.oracle_decimals as u32)?;
        let price = FixedPriceSource::new(answer as i128, config.oracle_decimals);
        let params = AuctionParams {
            fee_recipient: parse_account(&config.fee_recipient),
            fee_bps: config.fee_bps,
        };
        let world = World::new(admin, price, params).context("world setup failed")?;

        let mut authority_seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut authority_seed);

        Ok(Self {
            world,
            fhe: MockFhe::new(),
            authority_seed,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read(path).with_context(|| format!("reading state {}", path.display()))?;
        bincode::deserialize(&raw).with_context(|| format!("decoding state {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = bincode::serialize(self).context("encoding state")?;
        std::fs::write(path, raw).with_context(|| format!("writing state {}", path.display()))
    }

    pub fn authority(&self) -> DecryptionAuthority {
        DecryptionAuthority::from_seed(self.authority_seed)
    }

    pub fn verifier(&self) -> AuthorityVerifier {
        AuthorityVerifier::new(self.authority().verifying_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::parse_amount;

    #[test]
    fn state_survives_a_save_load_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.bin");

        let mut state = AppState::init(&CliConfig::default()).unwrap();
        let bob = parse_account("bob");
        state.world.fund_native(&bob, parse_amount("2").unwrap());
        state
            .world
            .deposit_and_mint(bob, parse_amount("1").unwrap(), parse_amount("500").unwrap())
            .unwrap();
        state.save(&path).unwrap();

        let restored = AppState::load(&path).unwrap();
        assert_eq!(restored.world, state.world);
        assert_eq!(
            restored.world.vault.position(&bob).debt,
            parse_amount("500").unwrap()
        );
    }

    #[test]
    fn authority_key_is_stable_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.bin");

        let state = AppState::init(&CliConfig::default()).unwrap();
        state.save(&path).unwrap();
        let restored = AppState::load(&path).unwrap();
        assert_eq!(
            state.authority().verifying_key(),
            restored.authority().verifying_key()
        );
    }
}
