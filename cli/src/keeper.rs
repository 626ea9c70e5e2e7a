//! Keeper commands.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use graze_engine::PRECISION;
use graze_keeper::KeeperConfig;

use crate::account::{format_amount, short};
use crate::store::AppState;

#[derive(Subcommand)]
pub enum KeeperCommands {
    /// Scan positions once and list liquidation candidates
    Scan,
    /// Watch positions on an interval, following the state file (Ctrl-C to stop)
    Watch {
        /// Polling interval in seconds
        #[arg(long, default_value = "10")]
        interval: u64,
    },
}

pub async fn run(state: &mut AppState, state_path: &Path, command: KeeperCommands) -> Result<()> {
    match command {
        KeeperCommands::Scan => {
            let candidates = graze_keeper::scan_once(&state.world)?;
            println!("{}", "=== Liquidation Candidates ===".bright_green().bold());
            if candidates.is_empty() {
                println!("{}", "all positions healthy".dimmed());
                return Ok(());
            }
            for candidate in candidates {
                println!(
                    "{} {} health {:.4} (debt {}, collateral {})",
                    "!".red().bold(),
                    short(&candidate.owner),
                    candidate.health as f64 / PRECISION as f64,
                    format_amount(candidate.debt),
                    format_amount(candidate.collateral),
                );
            }
            Ok(())
        }
        KeeperCommands::Watch { interval } => {
            let world = Arc::new(Mutex::new(state.world.clone()));

            // follow the state file so concurrent commands show up
            let shared = world.clone();
            let path = state_path.to_path_buf();
            let refresh = Duration::from_secs(interval.max(1));
            tokio::spawn(async move {
                loop {
                    match AppState::load(&path) {
                        Ok(fresh) => {
                            if let Ok(mut guard) = shared.lock() {
                                *guard = fresh.world;
                            }
                        }
                        Err(err) => log::warn!("keeper: state reload failed: {err:#}"),
                    }
                    tokio::time::sleep(refresh).await;
                }
            });

            graze_keeper::watch(
                world,
                KeeperConfig {
                    poll_interval_secs: interval,
                },
            )
            .await
        }
    }
}
