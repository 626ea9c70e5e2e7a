//! Graze CLI - operate the vault and auction engine locally.
//!
//! State is a single bincode file loaded before and saved after each
//! command; the mock homomorphic runtime and the decryption authority key
//! live in the same file, so a sealed auction can be driven end to end from
//! a shell.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

mod account;
mod auction;
mod config;
mod demo;
mod keeper;
mod oracle;
mod store;
mod vault;

use account::parse_account;
use store::AppState;

#[derive(Parser)]
#[command(name = "graze")]
#[command(about = "Graze protocol CLI - collateral vault and auction engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the state file
    #[arg(short, long, default_value = "graze-state.bin")]
    state: PathBuf,

    /// Path to a TOML config file (read by `init`)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Acting account: a known name (alice, bob, ...) or 32-byte hex
    #[arg(short, long, default_value = "alice")]
    account: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a fresh state file
    Init {
        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Advance the logical clock
    Advance {
        /// Seconds to advance
        seconds: u64,
    },

    /// Credit native currency to the acting account (local faucet)
    Fund {
        /// Amount in whole units (decimals allowed)
        amount: String,
    },

    /// Price feed operations
    Oracle {
        #[command(subcommand)]
        command: oracle::OracleCommands,
    },

    /// Asset registry operations
    Asset {
        #[command(subcommand)]
        command: oracle::AssetCommands,
    },

    /// Vault operations
    Vault {
        #[command(subcommand)]
        command: vault::VaultCommands,
    },

    /// Auction operations
    Auction {
        #[command(subcommand)]
        command: auction::AuctionCommands,
    },

    /// Keeper operations
    Keeper {
        #[command(subcommand)]
        command: keeper::KeeperCommands,
    },

    /// Run the scripted end-to-end scenario (in memory, state file untouched)
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Init { force } => {
            let config = config::load(cli.config.as_deref())?;
            if cli.state.exists() && !force {
                anyhow::bail!(
                    "state file {} exists; pass --force to overwrite",
                    cli.state.display()
                );
            }
            let state = AppState::init(&config)?;
            state.save(&cli.state)?;
            println!("{}", "=== Initialized ===".bright_green().bold());
            println!("{} {}", "State:".bright_cyan(), cli.state.display());
            println!("{} {} bps", "Fee:".bright_cyan(), config.fee_bps);
            Ok(())
        }
        Commands::Demo => demo::run(),
        command => {
            let mut state = AppState::load(&cli.state)
                .with_context(|| format!("run `graze init` first ({})", cli.state.display()))?;
            let sender = parse_account(&cli.account);
            dispatch(&mut state, &cli.state, sender, command).await?;
            state.save(&cli.state)
        }
    }
}

async fn dispatch(
    state: &mut AppState,
    state_path: &std::path::Path,
    sender: graze_engine::Address,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Advance { seconds } => {
            state.world.advance(seconds);
            println!(
                "{} clock is now {}",
                "Advanced:".bright_cyan(),
                state.world.clock
            );
            Ok(())
        }
        Commands::Fund { amount } => {
            let amount = account::parse_amount(&amount)?;
            state.world.fund_native(&sender, amount);
            println!(
                "{} {} native to {}",
                "Funded:".bright_cyan(),
                account::format_amount(amount),
                account::short(&sender)
            );
            Ok(())
        }
        Commands::Oracle { command } => oracle::run_oracle(state, command),
        Commands::Asset { command } => oracle::run_asset(state, sender, command),
        Commands::Vault { command } => vault::run(state, sender, command),
        Commands::Auction { command } => auction::run(state, sender, command),
        Commands::Keeper { command } => keeper::run(state, state_path, command).await,
        Commands::Init { .. } | Commands::Demo => unreachable!("handled in main"),
    }
}
