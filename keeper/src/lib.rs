//! Off-chain position monitor.
//!
//! Watches vault positions against the current oracle price and surfaces
//! the ones a liquidator should act on. Scanning is pure ([`health`]); the
//! watch loop just polls shared state on an interval and logs.

pub mod health;

pub use health::{scan_positions, LiquidationCandidate};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};

use graze_engine::{normalize_price, World};

/// Configuration for the watch loop.
#[derive(Debug, Clone)]
pub struct KeeperConfig {
    /// Polling interval in seconds
    pub poll_interval_secs: u64,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
        }
    }
}

/// One scan over the shared world. Returns candidates worst-first.
pub fn scan_once(world: &World) -> Result<Vec<LiquidationCandidate>> {
    let price = normalize_price(&world.price).context("oracle read failed")?;
    Ok(scan_positions(&world.vault, price))
}

/// Poll the shared world forever, logging liquidation candidates.
pub async fn watch(world: Arc<Mutex<World>>, config: KeeperConfig) -> Result<()> {
    let interval = Duration::from_secs(config.poll_interval_secs.max(1));
    log::info!("keeper: watching (every {:?})", interval);
    loop {
        {
            let world = world
                .lock()
                .map_err(|_| anyhow::anyhow!("world lock poisoned"))?;
            match scan_once(&world) {
                Ok(candidates) if candidates.is_empty() => {
                    log::debug!("keeper: all positions healthy");
                }
                Ok(candidates) => {
                    for candidate in &candidates {
                        log::warn!(
                            "keeper: liquidatable position (debt {}, collateral {})",
                            candidate.debt,
                            candidate.collateral
                        );
                    }
                }
                Err(err) => log::error!("keeper: scan failed: {err:#}"),
            }
        }
        tokio::time::sleep(interval).await;
    }
}
