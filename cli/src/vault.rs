//! Vault commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use graze_engine::vault::health_factor;
use graze_engine::{normalize_price, Address, PRECISION};

use crate::account::{format_amount, parse_account, parse_amount, short};
use crate::store::AppState;

#[derive(Subcommand)]
pub enum VaultCommands {
    /// Deposit native collateral and mint stable against it
    DepositMint {
        /// Native collateral to deposit
        #[arg(long)]
        collateral: String,
        /// Stable amount to mint
        #[arg(long)]
        mint: String,
    },
    /// Repay stable debt and withdraw collateral
    RepayWithdraw {
        #[arg(long, default_value = "0")]
        repay: String,
        #[arg(long, default_value = "0")]
        withdraw: String,
    },
    /// Liquidate an unhealthy position
    Liquidate {
        /// Debtor account (name or hex)
        debtor: String,
    },
    /// Show the acting account's position
    Status,
}

pub fn run(state: &mut AppState, sender: Address, command: VaultCommands) -> Result<()> {
    match command {
        VaultCommands::DepositMint { collateral, mint } => {
            let collateral = parse_amount(&collateral)?;
            let mint = parse_amount(&mint)?;
            state.world.deposit_and_mint(sender, collateral, mint)?;
            println!("{}", "=== Deposit & Mint ===".bright_green().bold());
            println!(
                "{} {} native in, {} stable out",
                "Done:".bright_cyan(),
                format_amount(collateral),
                format_amount(mint)
            );
            print_position(state, &sender);
            Ok(())
        }
        VaultCommands::RepayWithdraw { repay, withdraw } => {
            let repay = parse_amount(&repay)?;
            let withdraw = parse_amount(&withdraw)?;
            if repay > 0 {
                // the burn pulls against the vault's allowance
                let vault = state.world.vault.address();
                state.world.stable.approve(&sender, &vault, repay);
            }
            state.world.repay_and_withdraw(sender, repay, withdraw)?;
            println!("{}", "=== Repay & Withdraw ===".bright_green().bold());
            println!(
                "{} {} stable repaid, {} native out",
                "Done:".bright_cyan(),
                format_amount(repay),
                format_amount(withdraw)
            );
            print_position(state, &sender);
            Ok(())
        }
        VaultCommands::Liquidate { debtor } => {
            let debtor = parse_account(&debtor);
            let debt = state.world.vault.position(&debtor).debt;
            let vault = state.world.vault.address();
            state.world.stable.approve(&sender, &vault, debt);
            let receipt = state.world.liquidate(sender, &debtor)?;
            println!("{}", "=== Liquidation ===".bright_green().bold());
            println!("{} {}", "Debtor:".bright_cyan(), short(&debtor));
            println!(
                "{} {} stable",
                "Repaid:".bright_cyan(),
                format_amount(receipt.repaid)
            );
            println!(
                "{} {} native",
                "Seized:".bright_cyan(),
                format_amount(receipt.seized)
            );
            Ok(())
        }
        VaultCommands::Status => {
            println!("{}", "=== Vault Status ===".bright_green().bold());
            println!(
                "{} {}",
                "As of:".bright_cyan(),
                chrono::Utc::now().to_rfc3339()
            );
            print_position(state, &sender);
            println!(
                "{} {} stable",
                "Balance:".bright_cyan(),
                format_amount(state.world.stable.balance_of(&sender))
            );
            println!(
                "{} {} native",
                "Native:".bright_cyan(),
                format_amount(state.world.native_balance(&sender))
            );
            Ok(())
        }
    }
}

fn print_position(state: &AppState, who: &Address) {
    let position = state.world.vault.position(who);
    println!(
        "{} {} collateral / {} debt",
        "Position:".bright_cyan(),
        format_amount(position.collateral),
        format_amount(position.debt)
    );
    if let Ok(price) = normalize_price(&state.world.price) {
        match health_factor(&position, price) {
            Ok(u128::MAX) => println!("{} {}", "Health:".bright_cyan(), "no debt".dimmed()),
            Ok(health) => {
                let display = format!("{:.4}", health as f64 / PRECISION as f64);
                if health <= graze_engine::LIQUIDATION_THRESHOLD {
                    println!("{} {}", "Health:".bright_cyan(), display.red().bold());
                } else {
                    println!("{} {}", "Health:".bright_cyan(), display);
                }
            }
            Err(err) => println!("{} {}", "Health:".bright_cyan(), err.to_string().red()),
        }
    }
}
