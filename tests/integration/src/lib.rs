//! Cross-crate end-to-end flows: vault funding, open and sealed auctions,
//! settlement through the real ed25519 authority, and keeper scanning.

#[cfg(test)]
mod tests {
    use graze_authority::{AuthorityVerifier, DecryptionAuthority, MockFhe};
    use graze_engine::*;
    use graze_keeper::scan_positions;
    use rand::RngCore;

    const ONE: u128 = PRECISION;

    const ADMIN: Address = [1u8; 32];
    const ALICE: Address = [2u8; 32];
    const BOB: Address = [3u8; 32];
    const CARLOS: Address = [4u8; 32];
    const TREASURY: Address = [5u8; 32];

    struct Harness {
        world: World,
        fhe: MockFhe,
        authority: DecryptionAuthority,
        verifier: AuthorityVerifier,
    }

    fn harness(fee_bps: u16) -> Harness {
        let world = World::new(
            ADMIN,
            FixedPriceSource::new(2_000_00000000, 8),
            AuctionParams {
                fee_recipient: TREASURY,
                fee_bps,
            },
        )
        .unwrap();

        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        let authority = DecryptionAuthority::from_seed(seed);
        let verifier = AuthorityVerifier::new(authority.verifying_key());

        Harness {
            world,
            fhe: MockFhe::new(),
            authority,
            verifier,
        }
    }

    /// Bidders acquire stable through the vault, bid on an escrowed asset,
    /// the auction settles and the loser is made whole. The original full
    /// system flow.
    #[test]
    fn full_flow_vault_to_open_auction() {
        let mut h = harness(0);
        let world = &mut h.world;

        // bidders mint stable against native collateral
        world.fund_native(&BOB, ONE);
        world.fund_native(&CARLOS, ONE);
        world.deposit_and_mint(BOB, ONE, 500 * ONE).unwrap();
        world.deposit_and_mint(CARLOS, ONE, 500 * ONE).unwrap();

        // Alice escrows a provenance-carrying asset
        let asset = world.assets.mint(&ALICE, "Soy", 100, "Warehouse A");
        let house = world.auctions.address();
        world.assets.approve(&ALICE, house, asset).unwrap();
        let ctx = world.ctx(ALICE);
        let asset_contract = world.assets.address();
        let payment_token = world.stable.address();
        let id = world
            .auctions
            .create_auction(
                &mut world.assets,
                &ctx,
                asset_contract,
                asset,
                payment_token,
                3_600,
                false,
                0,
            )
            .unwrap();

        world.stable.approve(&BOB, &house, 100 * ONE);
        let ctx = world.ctx(BOB);
        world
            .auctions
            .place_bid(&mut world.stable, &ctx, id, 100 * ONE)
            .unwrap();
        world.stable.approve(&CARLOS, &house, 500 * ONE);
        let ctx = world.ctx(CARLOS);
        world
            .auctions
            .place_bid(&mut world.stable, &ctx, id, 500 * ONE)
            .unwrap();

        world.advance(3_601);
        let ctx = world.ctx(ALICE);
        world
            .auctions
            .finalize_with_proof(
                &mut world.stable,
                &mut world.assets,
                &ctx,
                id,
                CARLOS,
                500 * ONE,
                b"",
            )
            .unwrap();
        world.auctions.refund_losers(&mut world.stable, id).unwrap();

        assert_eq!(world.assets.owner_of(asset).unwrap(), CARLOS);
        assert_eq!(world.stable.balance_of(&ALICE), 500 * ONE);
        assert_eq!(world.stable.balance_of(&BOB), 500 * ONE);
        assert_eq!(world.stable.balance_of(&house), 0);
    }

    /// Sealed bids, decryption request, signed attestation, settlement with
    /// a 2.5% fee, loser refund. The original confidential flow.
    #[test]
    fn full_flow_sealed_auction_with_fee() {
        let mut h = harness(250);
        let world = &mut h.world;

        world.fund_native(&BOB, ONE);
        world.fund_native(&CARLOS, ONE);
        world.deposit_and_mint(BOB, ONE, 500 * ONE).unwrap();
        world.deposit_and_mint(CARLOS, ONE, 500 * ONE).unwrap();

        let asset = world.assets.mint(&ALICE, "Soy", 100, "Warehouse A");
        let house = world.auctions.address();
        world.assets.approve(&ALICE, house, asset).unwrap();
        let ctx = world.ctx(ALICE);
        let asset_contract = world.assets.address();
        let payment_token = world.stable.address();
        let id = world
            .auctions
            .create_auction(
                &mut world.assets,
                &ctx,
                asset_contract,
                asset,
                payment_token,
                3_600,
                true,
                100,
            )
            .unwrap();

        // Bob seals 100 under a 100 deposit, Carlos seals 200 under 200
        for (who, value) in [(BOB, 100u128), (CARLOS, 200u128)] {
            let deposit = value * ONE;
            world.stable.approve(&who, &house, deposit);
            let handle = h.fhe.encrypt(value * ONE);
            let ctx = world.ctx(who);
            world
                .auctions
                .submit_encrypted_bid(&mut world.stable, &mut h.fhe, &ctx, id, handle, deposit)
                .unwrap();
        }

        // nothing readable on-chain before fulfillment
        assert!(world.auctions.bid(id, &BOB).unwrap().ciphertext.is_some());

        world.advance(3_601);
        let ctx = world.ctx(ALICE);
        let request = world.auctions.finalize_auction(&ctx, id).unwrap();

        let (amount, index, signature) = h.authority.fulfill(&h.fhe, &request).unwrap();
        assert_eq!(amount, 200 * ONE);

        let ctx = world.ctx(BOB); // anyone may fulfill
        world
            .auctions
            .fulfill_auction(
                &mut world.stable,
                &mut world.assets,
                &h.verifier,
                &ctx,
                id,
                amount,
                index,
                &signature,
            )
            .unwrap();

        // 2.5% of 200: seller 195, treasury 5
        assert_eq!(world.assets.owner_of(asset).unwrap(), CARLOS);
        assert_eq!(world.stable.balance_of(&ALICE), 195 * ONE);
        assert_eq!(world.stable.balance_of(&TREASURY), 5 * ONE);
        assert_eq!(world.stable.balance_of(&house), 100 * ONE);

        world.auctions.refund_losers(&mut world.stable, id).unwrap();
        assert_eq!(world.stable.balance_of(&BOB), 500 * ONE);
        assert_eq!(world.stable.balance_of(&CARLOS), 300 * ONE);
        assert_eq!(world.stable.balance_of(&house), 0);
    }

    /// A forged or replayed attestation cannot settle; the genuine one
    /// settles exactly once.
    #[test]
    fn attestation_binding_end_to_end() {
        let mut h = harness(0);
        let world = &mut h.world;

        world.fund_native(&BOB, ONE);
        world.deposit_and_mint(BOB, ONE, 500 * ONE).unwrap();

        let asset = world.assets.mint(&ALICE, "Soy", 100, "Warehouse A");
        let house = world.auctions.address();
        world.assets.approve(&ALICE, house, asset).unwrap();
        let ctx = world.ctx(ALICE);
        let asset_contract = world.assets.address();
        let payment_token = world.stable.address();
        let id = world
            .auctions
            .create_auction(
                &mut world.assets,
                &ctx,
                asset_contract,
                asset,
                payment_token,
                3_600,
                true,
                0,
            )
            .unwrap();

        world.stable.approve(&BOB, &house, 200 * ONE);
        let handle = h.fhe.encrypt(200 * ONE);
        let ctx = world.ctx(BOB);
        world
            .auctions
            .submit_encrypted_bid(&mut world.stable, &mut h.fhe, &ctx, id, handle, 200 * ONE)
            .unwrap();

        world.advance(3_601);
        let ctx = world.ctx(ALICE);
        let request = world.auctions.finalize_auction(&ctx, id).unwrap();
        let (amount, index, signature) = h.authority.fulfill(&h.fhe, &request).unwrap();

        // a signature over different values does not bind to these handles
        let forged = h
            .authority
            .attest(
                &[request.highest_bid, request.winner_index],
                &[amount / 2, index as u128],
            )
            .unwrap();
        let ctx = world.ctx(BOB);
        assert_eq!(
            world.auctions.fulfill_auction(
                &mut world.stable,
                &mut world.assets,
                &h.verifier,
                &ctx,
                id,
                amount,
                index,
                &forged,
            ),
            Err(EngineError::InvalidAttestation)
        );

        world
            .auctions
            .fulfill_auction(
                &mut world.stable,
                &mut world.assets,
                &h.verifier,
                &ctx,
                id,
                amount,
                index,
                &signature,
            )
            .unwrap();

        // replay: terminal state rejects the second settlement
        assert_eq!(
            world.auctions.fulfill_auction(
                &mut world.stable,
                &mut world.assets,
                &h.verifier,
                &ctx,
                id,
                amount,
                index,
                &signature,
            ),
            Err(EngineError::InvalidState {
                expected: AuctionStatus::AwaitingDecryption,
                got: AuctionStatus::Finalized,
            })
        );
    }

    /// Price crash: the keeper flags the position, a liquidator closes it,
    /// and the exact bonus-adjusted seizure numbers come out.
    #[test]
    fn keeper_flags_and_liquidator_closes() {
        let mut h = harness(0);
        let world = &mut h.world;

        world.fund_native(&BOB, ONE);
        world.fund_native(&CARLOS, ONE);
        world.deposit_and_mint(BOB, ONE, 1_000 * ONE).unwrap();
        world.deposit_and_mint(CARLOS, ONE, 500 * ONE).unwrap();

        world.price.set_answer(1_100_00000000);
        let price = normalize_price(&world.price).unwrap();
        let candidates = scan_positions(&world.vault, price);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].owner, BOB);

        // Carlos repays Bob's 1000 debt (500 of his own + 500 from Bob)
        world.stable.transfer(&BOB, &CARLOS, 500 * ONE).unwrap();
        world
            .stable
            .approve(&CARLOS, &world.vault.address(), 1_000 * ONE);
        let receipt = world.liquidate(CARLOS, &BOB).unwrap();

        assert_eq!(receipt.seized, 954_545_454_545_454_545);
        assert_eq!(world.vault.position(&BOB).collateral, 45_454_545_454_545_455);
        assert_eq!(world.vault.position(&BOB).debt, 0);
        assert_eq!(world.native_balance(&CARLOS), receipt.seized);

        // nothing left to flag
        assert!(scan_positions(&world.vault, price).is_empty());
    }
}
