//! Auction commands.
//!
//! `fulfill` plays the relayer: it opens the auction's stored handles
//! against the local mock runtime, signs the attestation with the state
//! file's authority key, and feeds both back into the engine.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use graze_engine::{Address, AuctionStatus, DecryptionRequest};

use crate::account::{format_amount, parse_amount, short};
use crate::store::AppState;

#[derive(Subcommand)]
pub enum AuctionCommands {
    /// Escrow an owned asset and open an auction
    Create {
        /// Asset id to auction
        #[arg(long)]
        asset: u64,
        /// Bidding window in seconds from now
        #[arg(long, default_value = "3600")]
        duration: u64,
        /// Accept sealed (encrypted) bids only
        #[arg(long)]
        sealed: bool,
        /// Minimum bid / deposit
        #[arg(long, default_value = "0")]
        min_deposit: String,
    },
    /// Place an open bid
    Bid { id: u64, amount: String },
    /// Seal a secret bid value under a deposit
    SealedBid {
        id: u64,
        /// Secret bid value (encrypted locally, never stored in the clear)
        #[arg(long)]
        value: String,
        /// Plaintext collateral deposit
        #[arg(long)]
        deposit: String,
    },
    /// Settle an ended open auction
    Finalize { id: u64 },
    /// Close sealed bidding and request decryption
    Decrypt { id: u64 },
    /// Settle a sealed auction with the authority's attestation
    Fulfill { id: u64 },
    /// Cancel an ended, bid-less auction (seller only)
    Cancel { id: u64 },
    /// Refund losing bidders
    Refund { id: u64 },
    /// Show one auction
    Show {
        id: u64,
        /// Emit machine-readable JSON instead of the table
        #[arg(long)]
        json: bool,
    },
    /// List all auctions
    List,
}

pub fn run(state: &mut AppState, sender: Address, command: AuctionCommands) -> Result<()> {
    match command {
        AuctionCommands::Create {
            asset,
            duration,
            sealed,
            min_deposit,
        } => {
            let min_deposit = parse_amount(&min_deposit)?;
            let house = state.world.auctions.address();
            state.world.assets.approve(&sender, house, asset)?;

            let ctx = state.world.ctx(sender);
            let asset_contract = state.world.assets.address();
            let payment_token = state.world.stable.address();
            let id = state.world.auctions.create_auction(
                &mut state.world.assets,
                &ctx,
                asset_contract,
                asset,
                payment_token,
                state.world.clock + duration,
                sealed,
                min_deposit,
            )?;
            println!("{}", "=== Auction Created ===".bright_green().bold());
            println!("{} {}", "Id:".bright_cyan(), id);
            println!("{} {}", "Sealed:".bright_cyan(), sealed);
            println!(
                "{} {}",
                "Bidding ends:".bright_cyan(),
                state.world.clock + duration
            );
            Ok(())
        }
        AuctionCommands::Bid { id, amount } => {
            let amount = parse_amount(&amount)?;
            let house = state.world.auctions.address();
            state.world.stable.approve(&sender, &house, amount);

            let ctx = state.world.ctx(sender);
            state
                .world
                .auctions
                .place_bid(&mut state.world.stable, &ctx, id, amount)?;
            println!("{}", "=== Bid Placed ===".bright_green().bold());
            println!(
                "{} {} on auction {}",
                "Escrowed:".bright_cyan(),
                format_amount(amount),
                id
            );
            Ok(())
        }
        AuctionCommands::SealedBid { id, value, deposit } => {
            let value = parse_amount(&value)?;
            let deposit = parse_amount(&deposit)?;
            let house = state.world.auctions.address();
            state.world.stable.approve(&sender, &house, deposit);

            let handle = state.fhe.encrypt(value);
            let ctx = state.world.ctx(sender);
            state.world.auctions.submit_encrypted_bid(
                &mut state.world.stable,
                &mut state.fhe,
                &ctx,
                id,
                handle,
                deposit,
            )?;
            println!("{}", "=== Sealed Bid ===".bright_green().bold());
            println!("{} {:?}", "Handle:".bright_cyan(), handle);
            println!(
                "{} {} on auction {}",
                "Deposit escrowed:".bright_cyan(),
                format_amount(deposit),
                id
            );
            Ok(())
        }
        AuctionCommands::Finalize { id } => {
            let (winner, amount) = {
                let auction = state.world.auctions.auction(id)?;
                (
                    auction.highest_bidder.context("no bids recorded")?,
                    auction.highest_bid,
                )
            };
            let ctx = state.world.ctx(sender);
            state.world.auctions.finalize_with_proof(
                &mut state.world.stable,
                &mut state.world.assets,
                &ctx,
                id,
                winner,
                amount,
                b"",
            )?;
            println!("{}", "=== Auction Finalized ===".bright_green().bold());
            println!("{} {}", "Winner:".bright_cyan(), short(&winner));
            println!("{} {}", "Amount:".bright_cyan(), format_amount(amount));
            Ok(())
        }
        AuctionCommands::Decrypt { id } => {
            let ctx = state.world.ctx(sender);
            let request = state.world.auctions.finalize_auction(&ctx, id)?;
            println!("{}", "=== Decryption Requested ===".bright_green().bold());
            println!("{} {:?}", "Highest bid:".bright_cyan(), request.highest_bid);
            println!(
                "{} {:?}",
                "Winner index:".bright_cyan(),
                request.winner_index
            );
            Ok(())
        }
        AuctionCommands::Fulfill { id } => {
            let request = {
                let auction = state.world.auctions.auction(id)?;
                DecryptionRequest {
                    auction_id: id,
                    highest_bid: auction
                        .highest_bid_handle
                        .context("auction holds no encrypted state")?,
                    winner_index: auction
                        .winner_index_handle
                        .context("auction holds no encrypted state")?,
                }
            };
            let authority = state.authority();
            let (amount, index, signature) = authority.fulfill(&state.fhe, &request)?;

            let verifier = state.verifier();
            let ctx = state.world.ctx(sender);
            state.world.auctions.fulfill_auction(
                &mut state.world.stable,
                &mut state.world.assets,
                &verifier,
                &ctx,
                id,
                amount,
                index,
                &signature,
            )?;
            println!("{}", "=== Auction Fulfilled ===".bright_green().bold());
            println!("{} {}", "Amount:".bright_cyan(), format_amount(amount));
            println!("{} {}", "Winner index:".bright_cyan(), index);
            Ok(())
        }
        AuctionCommands::Cancel { id } => {
            let ctx = state.world.ctx(sender);
            state
                .world
                .auctions
                .cancel_auction(&mut state.world.assets, &ctx, id)?;
            println!("{}", "=== Auction Cancelled ===".bright_green().bold());
            Ok(())
        }
        AuctionCommands::Refund { id } => {
            let refunded = state.world.auctions.refund_losers(&mut state.world.stable, id)?;
            println!("{}", "=== Losers Refunded ===".bright_green().bold());
            println!("{} {}", "Total:".bright_cyan(), format_amount(refunded));
            Ok(())
        }
        AuctionCommands::Show { id, json } => {
            if json {
                let auction = state.world.auctions.auction(id)?;
                println!("{}", serde_json::to_string_pretty(auction)?);
                return Ok(());
            }
            print_auction(state, id)
        }
        AuctionCommands::List => {
            println!("{}", "=== Auctions ===".bright_green().bold());
            let ids: Vec<u64> = state.world.auctions.auctions().map(|a| a.id).collect();
            if ids.is_empty() {
                println!("{}", "none".dimmed());
            }
            for id in ids {
                print_auction(state, id)?;
            }
            Ok(())
        }
    }
}

fn print_auction(state: &AppState, id: u64) -> Result<()> {
    let auction = state.world.auctions.auction(id)?;
    println!("{}", format!("=== Auction {id} ===").bright_green().bold());
    println!("{} {}", "Seller:".bright_cyan(), short(&auction.seller));
    println!("{} {:?}", "Status:".bright_cyan(), auction.status);
    println!("{} {}", "Asset:".bright_cyan(), auction.asset_id);
    println!("{} {}", "Sealed:".bright_cyan(), auction.encrypted);
    println!("{} {}", "Bids:".bright_cyan(), auction.bid_count);
    println!("{} {}", "Ends:".bright_cyan(), auction.bidding_end);
    match auction.status {
        AuctionStatus::Finalized => {
            if let Some(winner) = auction.winner {
                println!("{} {}", "Winner:".bright_cyan(), short(&winner));
            }
        }
        AuctionStatus::Open if !auction.encrypted && auction.bid_count > 0 => {
            println!(
                "{} {}",
                "Leading:".bright_cyan(),
                format_amount(auction.highest_bid)
            );
        }
        _ => {}
    }
    Ok(())
}
