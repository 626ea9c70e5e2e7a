//! Asset auctions over escrowed payment tokens.
//!
//! The house escrows the auctioned asset for the full lifetime of an open
//! auction and escrows every bid in the payment token. The core accounting
//! invariant, checked directly by tests: the house's payment-token balance
//! always equals the sum of outstanding unrefunded escrow across all
//! auctions.
//!
//! This module carries the plaintext (open-bid) path; the sealed-bid path
//! lives in [`crate::sealed`] on the same `AuctionHouse`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::CallContext;
use crate::error::{EngineError, Result};
use crate::math::fee_amount;
use crate::registry::AssetRegistry;
use crate::sealed::CiphertextHandle;
use crate::stable::StableAsset;
use crate::Address;

/// Auction lifecycle state. Transitions are one-directional.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionStatus {
    /// Accepting bids
    Open,
    /// Sealed auction waiting on the decryption authority
    AwaitingDecryption,
    /// Settled; asset with the winner
    Finalized,
    /// Ended with no bids; asset returned to the seller
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub id: u64,
    pub seller: Address,
    pub asset_contract: Address,
    pub asset_id: u64,
    pub payment_token: Address,
    pub bidding_end: u64,
    pub status: AuctionStatus,
    pub encrypted: bool,
    pub min_deposit: u128,
    pub winner: Option<Address>,
    /// Number of bid submissions (not distinct bidders)
    pub bid_count: u32,
    /// Running highest escrowed total (plaintext auctions)
    pub highest_bid: u128,
    pub highest_bidder: Option<Address>,
    /// Running encrypted maximum (sealed auctions)
    pub highest_bid_handle: Option<CiphertextHandle>,
    pub winner_index_handle: Option<CiphertextHandle>,
}

/// One bidder's escrow record for one auction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub bidder: Address,
    /// Payment tokens held in escrow: the bid amount (plaintext) or the
    /// collateral deposit (sealed)
    pub escrowed: u128,
    /// Sealed bid value, opaque to the engine
    pub ciphertext: Option<CiphertextHandle>,
    /// Escrow already returned or disbursed
    pub refunded: bool,
    pub submitted_at: u64,
}

/// One-time constructor configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionParams {
    pub fee_recipient: Address,
    pub fee_bps: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionHouse {
    address: Address,
    params: AuctionParams,
    next_id: u64,
    auctions: BTreeMap<u64, Auction>,
    /// (auction_id, bidder) -> bid
    bids: BTreeMap<(u64, Address), Bid>,
    /// Bidders per auction, in arrival order
    bidders: BTreeMap<u64, Vec<Address>>,
}

impl AuctionHouse {
    pub fn new(address: Address, params: AuctionParams) -> Self {
        Self {
            address,
            params,
            next_id: 0,
            auctions: BTreeMap::new(),
            bids: BTreeMap::new(),
            bidders: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn params(&self) -> &AuctionParams {
        &self.params
    }

    pub fn auction(&self, id: u64) -> Result<&Auction> {
        self.auctions.get(&id).ok_or(EngineError::AuctionNotFound(id))
    }

    pub fn auctions(&self) -> impl Iterator<Item = &Auction> {
        self.auctions.values()
    }

    pub fn bid(&self, id: u64, bidder: &Address) -> Option<&Bid> {
        self.bids.get(&(id, *bidder))
    }

    pub fn bidders(&self, id: u64) -> &[Address] {
        self.bidders.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sum of escrow the house still owes somebody. Equals the house's
    /// payment-token balance at every point in time.
    pub fn escrow_outstanding(&self) -> u128 {
        self.bids
            .values()
            .filter(|bid| !bid.refunded)
            .map(|bid| bid.escrowed)
            .sum()
    }

    /// Escrow the caller's asset and open an auction.
    pub fn create_auction(
        &mut self,
        assets: &mut AssetRegistry,
        ctx: &CallContext,
        asset_contract: Address,
        asset_id: u64,
        payment_token: Address,
        bidding_end: u64,
        encrypted: bool,
        min_deposit: u128,
    ) -> Result<u64> {
        if asset_contract != assets.address() {
            return Err(EngineError::AssetMismatch);
        }
        if bidding_end <= ctx.timestamp {
            return Err(EngineError::InvalidEndTime);
        }

        // pull the asset into escrow; the seller must own it and have
        // approved the house
        assets.transfer_from(&self.address, &ctx.sender, &self.address, asset_id)?;

        let id = self.next_id;
        self.next_id += 1;
        self.auctions.insert(
            id,
            Auction {
                id,
                seller: ctx.sender,
                asset_contract,
                asset_id,
                payment_token,
                bidding_end,
                status: AuctionStatus::Open,
                encrypted,
                min_deposit,
                winner: None,
                bid_count: 0,
                highest_bid: 0,
                highest_bidder: None,
                highest_bid_handle: None,
                winner_index_handle: None,
            },
        );
        self.bidders.insert(id, Vec::new());
        log::info!("auction {}: opened (ends {})", id, bidding_end);
        Ok(id)
    }

    /// Escrow `amount` of the payment token as (part of) the caller's bid.
    ///
    /// A repeat bid accumulates into the bidder's escrowed total. The running
    /// highest updates only on a strict increase, so the first bidder to
    /// reach a given total wins a tie.
    pub fn place_bid(
        &mut self,
        pay: &mut StableAsset,
        ctx: &CallContext,
        id: u64,
        amount: u128,
    ) -> Result<()> {
        let auction = self.auction(id)?;
        if auction.status != AuctionStatus::Open {
            return Err(EngineError::InvalidState {
                expected: AuctionStatus::Open,
                got: auction.status,
            });
        }
        if auction.encrypted {
            return Err(EngineError::BidKindMismatch);
        }
        if ctx.timestamp >= auction.bidding_end {
            return Err(EngineError::BiddingEnded);
        }
        if pay.address() != auction.payment_token {
            return Err(EngineError::TokenMismatch);
        }
        if amount < auction.min_deposit {
            return Err(EngineError::DepositBelowMinimum {
                required: auction.min_deposit,
                got: amount,
            });
        }

        let prior = self
            .bids
            .get(&(id, ctx.sender))
            .map(|bid| bid.escrowed)
            .unwrap_or(0);
        let total = prior.checked_add(amount).ok_or(EngineError::Overflow)?;

        pay.transfer_from(&self.address, &ctx.sender, &self.address, amount)?;

        if prior == 0 {
            self.bidders.entry(id).or_default().push(ctx.sender);
        }
        self.bids.insert(
            (id, ctx.sender),
            Bid {
                bidder: ctx.sender,
                escrowed: total,
                ciphertext: None,
                refunded: false,
                submitted_at: ctx.timestamp,
            },
        );

        let auction = self.auctions.get_mut(&id).ok_or(EngineError::AuctionNotFound(id))?;
        auction.bid_count += 1;
        if total > auction.highest_bid {
            auction.highest_bid = total;
            auction.highest_bidder = Some(ctx.sender);
        }
        log::debug!("auction {}: bid {} (total {})", id, amount, total);
        Ok(())
    }

    /// Settle an ended open-bid auction.
    ///
    /// The supplied winner and amount must match what the house recorded
    /// while bids came in; the proof argument is unused on this path.
    #[allow(clippy::too_many_arguments)]
    pub fn finalize_with_proof(
        &mut self,
        pay: &mut StableAsset,
        assets: &mut AssetRegistry,
        ctx: &CallContext,
        id: u64,
        winner: Address,
        winning_amount: u128,
        _proof: &[u8],
    ) -> Result<()> {
        let auction = self.auction(id)?;
        if auction.status != AuctionStatus::Open {
            return Err(EngineError::InvalidState {
                expected: AuctionStatus::Open,
                got: auction.status,
            });
        }
        if auction.encrypted {
            return Err(EngineError::BidKindMismatch);
        }
        if ctx.timestamp < auction.bidding_end {
            return Err(EngineError::BiddingNotEnded);
        }
        if auction.bid_count == 0 {
            return Err(EngineError::NoBidsPlaced);
        }
        let recorded_winner = auction.highest_bidder.ok_or(EngineError::NoBidsPlaced)?;
        if winner != recorded_winner || winning_amount != auction.highest_bid {
            return Err(EngineError::WinnerMismatch);
        }
        let seller = auction.seller;
        let asset_id = auction.asset_id;

        self.disburse(pay, &seller, winning_amount)?;
        assets.transfer_from(&self.address, &self.address, &winner, asset_id)?;

        self.settle_winner(id, winner)?;
        log::info!("auction {}: finalized at {}", id, winning_amount);
        Ok(())
    }

    /// Call off an auction that ended without bids. Seller only.
    pub fn cancel_auction(
        &mut self,
        assets: &mut AssetRegistry,
        ctx: &CallContext,
        id: u64,
    ) -> Result<()> {
        let auction = self.auction(id)?;
        if ctx.sender != auction.seller {
            return Err(EngineError::NotSeller);
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
        if auction.bid_count != 0 {
            return Err(EngineError::AuctionHasBids);
        }
        let seller = auction.seller;
        let asset_id = auction.asset_id;

        assets.transfer_from(&self.address, &self.address, &seller, asset_id)?;
        let auction = self.auctions.get_mut(&id).ok_or(EngineError::AuctionNotFound(id))?;
        auction.status = AuctionStatus::Cancelled;
        log::info!("auction {}: cancelled", id);
        Ok(())
    }

    /// Return every non-winner's outstanding escrow. Callable by anyone,
    /// idempotent per bidder. Returns the total refunded by this call.
    pub fn refund_losers(&mut self, pay: &mut StableAsset, id: u64) -> Result<u128> {
        let auction = self.auction(id)?;
        if auction.status != AuctionStatus::Finalized {
            return Err(EngineError::InvalidState {
                expected: AuctionStatus::Finalized,
                got: auction.status,
            });
        }
        let winner = auction.winner;

        let mut refunded = 0u128;
        let bidders = self.bidders.get(&id).cloned().unwrap_or_default();
        for bidder in bidders {
            if Some(bidder) == winner {
                continue;
            }
            let Some(bid) = self.bids.get_mut(&(id, bidder)) else {
                continue;
            };
            if bid.refunded {
                continue;
            }
            pay.transfer(&self.address, &bidder, bid.escrowed)?;
            bid.refunded = true;
            refunded += bid.escrowed;
        }
        log::debug!("auction {}: refunded {}", id, refunded);
        Ok(refunded)
    }

    /// Store a sealed bid and the updated encrypted running maximum.
    pub(crate) fn record_sealed_bid(
        &mut self,
        ctx: &CallContext,
        id: u64,
        bid_handle: CiphertextHandle,
        deposit: u128,
        highest: CiphertextHandle,
        winner_index: CiphertextHandle,
    ) -> Result<()> {
        self.bidders.entry(id).or_default().push(ctx.sender);
        self.bids.insert(
            (id, ctx.sender),
            Bid {
                bidder: ctx.sender,
                escrowed: deposit,
                ciphertext: Some(bid_handle),
                refunded: false,
                submitted_at: ctx.timestamp,
            },
        );
        let auction = self
            .auctions
            .get_mut(&id)
            .ok_or(EngineError::AuctionNotFound(id))?;
        auction.bid_count += 1;
        auction.highest_bid_handle = Some(highest);
        auction.winner_index_handle = Some(winner_index);
        log::debug!("auction {}: sealed bid (deposit {})", id, deposit);
        Ok(())
    }

    pub(crate) fn set_status(&mut self, id: u64, status: AuctionStatus) -> Result<()> {
        let auction = self
            .auctions
            .get_mut(&id)
            .ok_or(EngineError::AuctionNotFound(id))?;
        auction.status = status;
        Ok(())
    }

    /// Mark the winner's escrow disbursed and close the auction.
    pub(crate) fn settle_winner(&mut self, id: u64, winner: Address) -> Result<()> {
        if let Some(bid) = self.bids.get_mut(&(id, winner)) {
            bid.refunded = true;
        }
        let auction = self
            .auctions
            .get_mut(&id)
            .ok_or(EngineError::AuctionNotFound(id))?;
        auction.status = AuctionStatus::Finalized;
        auction.winner = Some(winner);
        Ok(())
    }

    /// Split `amount` of escrowed payment between the seller and the fee
    /// recipient. Shared by both settlement paths.
    pub(crate) fn disburse(
        &mut self,
        pay: &mut StableAsset,
        seller: &Address,
        amount: u128,
    ) -> Result<u128> {
        if pay.balance_of(&self.address) < amount {
            return Err(EngineError::InsufficientBalance);
        }
        let fee = fee_amount(amount, self.params.fee_bps)?;
        let proceeds = amount.checked_sub(fee).ok_or(EngineError::Overflow)?;
        pay.transfer(&self.address, seller, proceeds)?;
        if fee > 0 {
            let recipient = self.params.fee_recipient;
            pay.transfer(&self.address, &recipient, fee)?;
        }
        Ok(fee)
    }
}
