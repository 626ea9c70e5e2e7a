//! Scripted end-to-end scenario.
//!
//! Runs entirely in memory: vault lifecycle including a liquidation, an open
//! auction with a refunded loser, and a sealed auction settled through the
//! mock runtime and the authority attestation. Each step asserts the
//! balances it changes, so a passing demo is a working system.

use anyhow::{ensure, Context, Result};
use colored::Colorize;

use graze_engine::{AuctionStatus, PRECISION};

use crate::account::{format_amount, parse_account, parse_amount};
use crate::config::CliConfig;
use crate::store::AppState;

const ONE: u128 = PRECISION;

fn step(text: &str) {
    println!("{} {}", "▸".bright_green(), text);
}

pub fn run() -> Result<()> {
    println!("{}", "=== Graze Demo ===".bright_green().bold());

    let mut state = AppState::init(&CliConfig::default())?;
    let alice = parse_account("alice");
    let bob = parse_account("bob");
    let carlos = parse_account("carlos");
    let treasury = parse_account("treasury");

    // --- vault ---
    step("Bob and Carlos fund vault positions at $2000/native");
    state.world.fund_native(&bob, 2 * ONE);
    state.world.fund_native(&carlos, 2 * ONE);
    state.world.deposit_and_mint(bob, ONE, 1_000 * ONE)?;
    state.world.deposit_and_mint(carlos, ONE, 500 * ONE)?;

    step("minting past the 150% bar is rejected");
    ensure!(
        state.world.deposit_and_mint(bob, 0, 400 * ONE).is_err(),
        "over-mint must fail"
    );

    step("price drops to $1100; Bob is liquidated by Carlos");
    state.world.price.set_answer(1_100_00000000);
    let vault = state.world.vault.address();
    state.world.stable.approve(&carlos, &vault, 1_000 * ONE);
    // Carlos needs Bob's worth of stable to repay; mint headroom is fine at 220%
    state
        .world
        .stable
        .transfer(&bob, &carlos, 500 * ONE)
        .context("moving stable for the liquidation")?;
    let receipt = state.world.liquidate(carlos, &bob)?;
    ensure!(
        receipt.seized == 954_545_454_545_454_545,
        "seizure vector mismatch: {}",
        receipt.seized
    );
    ensure!(state.world.vault.position(&bob).debt == 0, "debt must clear");
    println!(
        "  seized {} native, debtor keeps {}",
        format_amount(receipt.seized),
        format_amount(state.world.vault.position(&bob).collateral)
    );

    // --- open auction ---
    step("Alice auctions a registered asset; the higher bid wins");
    state.world.price.set_answer(2_000_00000000);
    // the liquidation burned Carlos's stable; mint fresh against his position
    state.world.deposit_and_mint(carlos, 0, 400 * ONE)?;
    let asset = state.world.assets.mint(&alice, "Soy", 100, "Warehouse A");
    let house = state.world.auctions.address();
    state.world.assets.approve(&alice, house, asset)?;
    let ctx = state.world.ctx(alice);
    let asset_contract = state.world.assets.address();
    let payment_token = state.world.stable.address();
    let auction = state.world.auctions.create_auction(
        &mut state.world.assets,
        &ctx,
        asset_contract,
        asset,
        payment_token,
        state.world.clock + 3_600,
        false,
        0,
    )?;

    state.world.stable.approve(&bob, &house, 100 * ONE);
    let ctx = state.world.ctx(bob);
    state
        .world
        .auctions
        .place_bid(&mut state.world.stable, &ctx, auction, 100 * ONE)?;
    state.world.stable.approve(&carlos, &house, 400 * ONE);
    let ctx = state.world.ctx(carlos);
    state
        .world
        .auctions
        .place_bid(&mut state.world.stable, &ctx, auction, 400 * ONE)?;

    state.world.advance(3_601);
    let ctx = state.world.ctx(alice);
    state.world.auctions.finalize_with_proof(
        &mut state.world.stable,
        &mut state.world.assets,
        &ctx,
        auction,
        carlos,
        400 * ONE,
        b"",
    )?;
    state
        .world
        .auctions
        .refund_losers(&mut state.world.stable, auction)?;

    ensure!(
        state.world.assets.owner_of(asset)? == carlos,
        "asset must reach the winner"
    );
    let fee = 400 * ONE * 250 / 10_000;
    ensure!(
        state.world.stable.balance_of(&alice) == 400 * ONE - fee,
        "seller proceeds mismatch"
    );
    ensure!(
        state.world.stable.balance_of(&treasury) == fee,
        "fee mismatch"
    );
    ensure!(
        state.world.stable.balance_of(&house) == 0,
        "escrow must drain"
    );
    println!(
        "  seller received {}, treasury {}",
        format_amount(400 * ONE - fee),
        format_amount(fee)
    );

    // --- sealed auction ---
    step("Alice runs a sealed auction; bids stay encrypted until fulfillment");
    state.world.deposit_and_mint(carlos, 0, 100 * ONE)?;
    let asset = state.world.assets.mint(&alice, "Corn", 40, "Silo 9");
    state.world.assets.approve(&alice, house, asset)?;
    let ctx = state.world.ctx(alice);
    let sealed = state.world.auctions.create_auction(
        &mut state.world.assets,
        &ctx,
        asset_contract,
        asset,
        payment_token,
        state.world.clock + 3_600,
        true,
        parse_amount("1")?,
    )?;

    for (who, value, deposit) in [(bob, 60u128, 60u128), (carlos, 80, 80)] {
        state.world.stable.approve(&who, &house, deposit * ONE);
        let handle = state.fhe.encrypt(value * ONE);
        let ctx = state.world.ctx(who);
        state.world.auctions.submit_encrypted_bid(
            &mut state.world.stable,
            &mut state.fhe,
            &ctx,
            sealed,
            handle,
            deposit * ONE,
        )?;
    }

    state.world.advance(3_601);
    let ctx = state.world.ctx(alice);
    let request = state.world.auctions.finalize_auction(&ctx, sealed)?;

    step("the authority opens the handles and signs; anyone fulfills");
    let authority = state.authority();
    let (amount, index, signature) = authority.fulfill(&state.fhe, &request)?;
    let verifier = state.verifier();
    let ctx = state.world.ctx(bob);
    state.world.auctions.fulfill_auction(
        &mut state.world.stable,
        &mut state.world.assets,
        &verifier,
        &ctx,
        sealed,
        amount,
        index,
        &signature,
    )?;
    state
        .world
        .auctions
        .refund_losers(&mut state.world.stable, sealed)?;

    ensure!(amount == 80 * ONE, "sealed winner amount mismatch");
    ensure!(
        state.world.assets.owner_of(asset)? == carlos,
        "sealed asset must reach the winner"
    );
    ensure!(
        state.world.auctions.auction(sealed)?.status == AuctionStatus::Finalized,
        "sealed auction must close"
    );
    ensure!(
        state.world.stable.balance_of(&house) == 0,
        "sealed escrow must drain"
    );

    println!("{}", "=== Demo Passed ===".bright_green().bold());
    Ok(())
}
