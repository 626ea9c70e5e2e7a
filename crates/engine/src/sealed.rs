//! Sealed-bid settlement path.
//!
//! Bid values never touch the engine in the clear. A bidder submits an
//! opaque ciphertext handle plus a plaintext collateral deposit; the engine
//! folds each handle into a running encrypted maximum through the
//! [`FheEvaluator`] capability, and after bidding closes it emits a
//! decryption request for the two tracked handles. Settlement happens only
//! when someone presents the decryption authority's signed attestation that
//! the revealed plaintexts correspond to exactly those handles.
//!
//! The engine verifies signature validity, not the semantic correctness of
//! the homomorphic computation: the trust model ends at the authority's key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::auction::AuctionStatus;
use crate::context::CallContext;
use crate::error::{EngineError, Result};
use crate::registry::AssetRegistry;
use crate::stable::StableAsset;
use crate::AuctionHouse;

/// Opaque handle to an encrypted value. Supports only equality and storage;
/// plaintexts are reachable solely through the external authority.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CiphertextHandle(pub [u8; 32]);

impl fmt::Debug for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CiphertextHandle(")?;
        for byte in &self.0[..8] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "..)")
    }
}

/// Homomorphic combinators supplied by the encryption runtime.
///
/// The engine only ever compares and selects; it can neither create a
/// meaningful ciphertext from a secret nor open one.
pub trait FheEvaluator {
    /// Encrypt a public value (bidder indices).
    fn trivial_encrypt(&mut self, value: u128) -> CiphertextHandle;

    /// Encrypted `lhs > rhs`.
    fn gt(&mut self, lhs: &CiphertextHandle, rhs: &CiphertextHandle) -> CiphertextHandle;

    /// Encrypted `cond ? on_true : on_false`.
    fn select(
        &mut self,
        cond: &CiphertextHandle,
        on_true: &CiphertextHandle,
        on_false: &CiphertextHandle,
    ) -> CiphertextHandle;
}

/// Verifies the decryption authority's attestation that `values` are the
/// plaintexts behind `handles`.
pub trait AttestationVerifier {
    fn verify(&self, handles: &[CiphertextHandle], values: &[u128], signature: &[u8]) -> bool;
}

/// Signal emitted when a sealed auction closes: the authority is asked to
/// open exactly these two handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecryptionRequest {
    pub auction_id: u64,
    pub highest_bid: CiphertextHandle,
    pub winner_index: CiphertextHandle,
}

impl AuctionHouse {
    /// Escrow a plaintext deposit against a sealed bid.
    ///
    /// One sealed bid per bidder per auction; the deposit collateralizes the
    /// unknown bid value and must cover it at settlement.
    pub fn submit_encrypted_bid(
        &mut self,
        pay: &mut StableAsset,
        fhe: &mut dyn FheEvaluator,
        ctx: &CallContext,
        id: u64,
        bid_handle: CiphertextHandle,
        deposit: u128,
    ) -> Result<()> {
        let auction = self.auction(id)?;
        if auction.status != AuctionStatus::Open {
            return Err(EngineError::InvalidState {
                expected: AuctionStatus::Open,
                got: auction.status,
            });
        }
        if !auction.encrypted {
            return Err(EngineError::BidKindMismatch);
        }
        if ctx.timestamp >= auction.bidding_end {
            return Err(EngineError::BiddingEnded);
        }
        if pay.address() != auction.payment_token {
            return Err(EngineError::TokenMismatch);
        }
        if deposit < auction.min_deposit {
            return Err(EngineError::DepositBelowMinimum {
                required: auction.min_deposit,
                got: deposit,
            });
        }
        if self.bid(id, &ctx.sender).is_some() {
            return Err(EngineError::AlreadyBid);
        }

        pay.transfer_from(&self.address(), &ctx.sender, &self.address(), deposit)?;

        let index = self.bidders(id).len() as u128;
        let (highest, winner_index) = {
            let auction = self.auction(id)?;
            match (auction.highest_bid_handle, auction.winner_index_handle) {
                (Some(highest), Some(winner_index)) => {
                    let cond = fhe.gt(&bid_handle, &highest);
                    let new_highest = fhe.select(&cond, &bid_handle, &highest);
                    let index_ct = fhe.trivial_encrypt(index);
                    let new_winner = fhe.select(&cond, &index_ct, &winner_index);
                    (new_highest, new_winner)
                }
                _ => (bid_handle, fhe.trivial_encrypt(index)),
            }
        };

        self.record_sealed_bid(ctx, id, bid_handle, deposit, highest, winner_index)
    }

    /// Close bidding on a sealed auction and request decryption of the
    /// tracked handles. Reveals nothing by itself.
    pub fn finalize_auction(&mut self, ctx: &CallContext, id: u64) -> Result<DecryptionRequest> {
        let auction = self.auction(id)?;
        if !auction.encrypted {
            return Err(EngineError::BidKindMismatch);
        }
        if auction.status != AuctionStatus::Open {
            return Err(EngineError::InvalidState {
                expected: AuctionStatus::Open,
                got: auction.status,
            });
        }
        if ctx.timestamp < auction.bidding_end {
            return Err(EngineError::BiddingNotEnded);
        }
        if auction.bid_count == 0 {
            return Err(EngineError::NoBidsPlaced);
        }
        let (Some(highest_bid), Some(winner_index)) =
            (auction.highest_bid_handle, auction.winner_index_handle)
        else {
            return Err(EngineError::NoBidsPlaced);
        };

        self.set_status(id, AuctionStatus::AwaitingDecryption)?;
        log::info!("auction {}: awaiting decryption", id);
        Ok(DecryptionRequest {
            auction_id: id,
            highest_bid,
            winner_index,
        })
    }

    /// Settle a sealed auction from the authority's attested plaintexts.
    ///
    /// Callable by anyone holding a valid attestation. The signature must
    /// bind `(winning_amount, winner_index)` to the auction's stored
    /// handles; settlement then mirrors the plaintext path, drawing the
    /// winning amount from the winner's deposit and returning any excess.
    #[allow(clippy::too_many_arguments)]
    pub fn fulfill_auction(
        &mut self,
        pay: &mut StableAsset,
        assets: &mut AssetRegistry,
        verifier: &dyn AttestationVerifier,
        _ctx: &CallContext,
        id: u64,
        winning_amount: u128,
        winner_index: u32,
        signature: &[u8],
    ) -> Result<()> {
        let auction = self.auction(id)?;
        if auction.status != AuctionStatus::AwaitingDecryption {
            return Err(EngineError::InvalidState {
                expected: AuctionStatus::AwaitingDecryption,
                got: auction.status,
            });
        }
        let (Some(highest_bid), Some(winner_index_handle)) =
            (auction.highest_bid_handle, auction.winner_index_handle)
        else {
            return Err(EngineError::InvalidAttestation);
        };
        if !verifier.verify(
            &[highest_bid, winner_index_handle],
            &[winning_amount, winner_index as u128],
            signature,
        ) {
            return Err(EngineError::InvalidAttestation);
        }

        let winner = self
            .bidders(id)
            .get(winner_index as usize)
            .copied()
            .ok_or(EngineError::WinnerIndexOutOfRange)?;
        let deposit = self
            .bid(id, &winner)
            .map(|bid| bid.escrowed)
            .ok_or(EngineError::WinnerIndexOutOfRange)?;
        let excess = deposit
            .checked_sub(winning_amount)
            .ok_or(EngineError::DepositShortfall)?;

        let auction = self.auction(id)?;
        let seller = auction.seller;
        let asset_id = auction.asset_id;

        self.disburse(pay, &seller, winning_amount)?;
        if excess > 0 {
            pay.transfer(&self.address(), &winner, excess)?;
        }
        assets.transfer_from(&self.address(), &self.address(), &winner, asset_id)?;

        self.settle_winner(id, winner)?;
        log::info!("auction {}: fulfilled at {}", id, winning_amount);
        Ok(())
    }
}
