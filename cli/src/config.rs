//! CLI configuration.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Deployment-style parameters, read once at `init`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Auction fee in basis points
    pub fee_bps: u16,
    /// Fee recipient account (name or 32-byte hex)
    pub fee_recipient: String,
    /// Initial oracle answer, in feed decimals
    pub oracle_price: String,
    /// Feed decimal precision
    pub oracle_decimals: u8,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            fee_bps: 250,
            fee_recipient: "treasury".to_string(),
            oracle_price: "2000".to_string(),
            oracle_decimals: 8,
        }
    }
}

/// Load the config file, or defaults when none is given.
pub fn load(path: Option<&Path>) -> Result<CliConfig> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}
