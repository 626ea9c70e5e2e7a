//! Engine error types.

use thiserror::Error;

use crate::auction::AuctionStatus;

/// Errors that can abort an engine operation.
///
/// Every variant is fatal to the triggering call: the operation returns with
/// no state change and no internal retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    // --- preconditions ---
    #[error("not the seller")]
    NotSeller,

    #[error("not the token minter")]
    NotMinter,

    #[error("minter capability already handed off")]
    MinterAlreadyTransferred,

    #[error("caller is not owner or approved")]
    NotAuthorized,

    // --- vault invariants ---
    #[error("vault health too low")]
    VaultHealthTooLow,

    #[error("vault not liquidatable")]
    VaultNotLiquidatable,

    #[error("repay exceeds outstanding debt")]
    RepayExceedsDebt,

    #[error("insufficient collateral")]
    InsufficientCollateral,

    // --- auction state ---
    #[error("auction not found: {0}")]
    AuctionNotFound(u64),

    #[error("invalid state: expected {expected:?}, got {got:?}")]
    InvalidState {
        expected: AuctionStatus,
        got: AuctionStatus,
    },

    #[error("bidding period ended")]
    BiddingEnded,

    #[error("bidding period not ended")]
    BiddingNotEnded,

    #[error("bidding end time not in the future")]
    InvalidEndTime,

    #[error("no bids placed")]
    NoBidsPlaced,

    #[error("auction has bids")]
    AuctionHasBids,

    #[error("already submitted a sealed bid")]
    AlreadyBid,

    #[error("auction does not accept this bid kind")]
    BidKindMismatch,

    #[error("deposit below minimum: need {required}, got {got}")]
    DepositBelowMinimum { required: u128, got: u128 },

    #[error("supplied winner does not match recorded bids")]
    WinnerMismatch,

    // --- external verification ---
    #[error("invalid oracle price")]
    InvalidPrice,

    #[error("stale oracle round")]
    StaleRound,

    #[error("invalid decryption attestation")]
    InvalidAttestation,

    #[error("attested winner index out of range")]
    WinnerIndexOutOfRange,

    #[error("winner deposit cannot cover the attested amount")]
    DepositShortfall,

    // --- resources ---
    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("insufficient allowance")]
    InsufficientAllowance,

    #[error("unknown asset: {0}")]
    UnknownAsset(u64),

    #[error("unexpected payment token for this auction")]
    TokenMismatch,

    #[error("unexpected asset contract for this auction")]
    AssetMismatch,

    #[error("arithmetic overflow")]
    Overflow,
}

pub type Result<T> = core::result::Result<T, EngineError>;
