//! Price feed and asset registry commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use graze_engine::{normalize_price, Address};

use crate::account::{format_amount, parse_scaled, short};
use crate::store::AppState;

#[derive(Subcommand)]
pub enum OracleCommands {
    /// Publish a new price (in whole dollars, decimals allowed)
    Set { price: String },
    /// Show the current feed state
    Show,
}

#[derive(Subcommand)]
pub enum AssetCommands {
    /// Mint a new asset with provenance metadata to the acting account
    Mint {
        #[arg(long)]
        asset_type: String,
        #[arg(long)]
        quantity: u64,
        #[arg(long)]
        location: String,
    },
    /// Show one asset
    Show { id: u64 },
}

pub fn run_oracle(state: &mut AppState, command: OracleCommands) -> Result<()> {
    match command {
        OracleCommands::Set { price } => {
            let decimals = state.world.price.decimals();
            let answer = parse_scaled(&price, decimals as u32)?;
            state.world.price.set_answer(answer as i128);
            println!("{}", "=== Oracle Updated ===".bright_green().bold());
            println!("{} ${}", "Price:".bright_cyan(), price);
            Ok(())
        }
        OracleCommands::Show => {
            println!("{}", "=== Oracle ===".bright_green().bold());
            println!(
                "{} {} ({} decimals)",
                "Raw answer:".bright_cyan(),
                state.world.price.answer(),
                state.world.price.decimals()
            );
            match normalize_price(&state.world.price) {
                Ok(normalized) => println!(
                    "{} {} (18 decimals)",
                    "Normalized:".bright_cyan(),
                    format_amount(normalized)
                ),
                Err(err) => println!("{} {}", "Normalized:".bright_cyan(), err.to_string().red()),
            }
            Ok(())
        }
    }
}

pub fn run_asset(state: &mut AppState, sender: Address, command: AssetCommands) -> Result<()> {
    match command {
        AssetCommands::Mint {
            asset_type,
            quantity,
            location,
        } => {
            let id = state
                .world
                .assets
                .mint(&sender, asset_type.clone(), quantity, location.clone());
            println!("{}", "=== Asset Minted ===".bright_green().bold());
            println!("{} {}", "Id:".bright_cyan(), id);
            println!("{} {}", "Owner:".bright_cyan(), short(&sender));
            println!(
                "{} {} x{} @ {}",
                "Provenance:".bright_cyan(),
                asset_type,
                quantity,
                location
            );
            Ok(())
        }
        AssetCommands::Show { id } => {
            let owner = state.world.assets.owner_of(id)?;
            let meta = state.world.assets.metadata_of(id)?;
            println!("{}", format!("=== Asset {id} ===").bright_green().bold());
            println!("{} {}", "Owner:".bright_cyan(), short(&owner));
            println!(
                "{} {} x{} @ {}",
                "Provenance:".bright_cyan(),
                meta.asset_type,
                meta.quantity,
                meta.location
            );
            Ok(())
        }
    }
}
