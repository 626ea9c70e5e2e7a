//! Core state machines for the Graze protocol.
//!
//! This crate implements the financial heart of the system as plain,
//! deterministic Rust: an overcollateralized stablecoin vault, a fungible
//! stable-asset ledger with a single-minter capability, a provenance-carrying
//! non-fungible registry, and an auction house with open-bid and sealed-bid
//! settlement paths.
//!
//! Every operation is check-then-commit: a call either applies completely or
//! returns an error having touched nothing. The surrounding runtime is
//! expected to serialize calls; no operation blocks or retries internally.
//!
//! External collaborators are modeled as capability traits at the seams:
//! price feeds ([`oracle::PriceSource`]), the homomorphic bid evaluator
//! ([`sealed::FheEvaluator`]) and the decryption authority
//! ([`sealed::AttestationVerifier`]).

#![forbid(unsafe_code)]

pub mod auction;
pub mod context;
pub mod error;
pub mod math;
pub mod oracle;
pub mod registry;
pub mod sealed;
pub mod stable;
pub mod vault;
pub mod world;

/// Generic account/contract address (32 bytes).
pub type Address = [u8; 32];

pub use auction::{Auction, AuctionHouse, AuctionParams, AuctionStatus, Bid};
pub use context::CallContext;
pub use error::{EngineError, Result};
pub use math::{BPS_SCALE, PRECISION};
pub use oracle::{normalize_price, FixedPriceSource, PriceRound, PriceSource};
pub use registry::{AssetMetadata, AssetRegistry};
pub use sealed::{AttestationVerifier, CiphertextHandle, DecryptionRequest, FheEvaluator};
pub use stable::StableAsset;
pub use vault::{
    CollateralVault, LiquidationReceipt, Position, LIQUIDATION_BONUS, LIQUIDATION_THRESHOLD,
    MINT_THRESHOLD,
};
pub use world::World;
