//! Price feed adapter.
//!
//! The engine trusts an external price source unconditionally; this module
//! only normalizes whatever decimal precision the source reports to the
//! engine's 18-decimal fixed point.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// One round of an external price feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceRound {
    pub round_id: u64,
    /// Price in the source's native decimals; non-positive values are invalid.
    pub answer: i128,
    pub started_at: u64,
    pub updated_at: u64,
    pub answered_in_round: u64,
    /// Decimal precision of `answer`.
    pub decimals: u8,
}

/// Read-only price source.
pub trait PriceSource {
    fn latest_round(&self) -> Result<PriceRound>;
}

/// Read the latest round and rescale it to 18-decimal fixed point.
///
/// Fails on non-positive answers and on rounds answered before they were
/// started; any other staleness policy is the feed's concern, not ours.
pub fn normalize_price(source: &dyn PriceSource) -> Result<u128> {
    let round = source.latest_round()?;
    if round.answer <= 0 {
        return Err(EngineError::InvalidPrice);
    }
    if round.answered_in_round < round.round_id {
        return Err(EngineError::StaleRound);
    }
    let raw = round.answer as u128;
    if round.decimals <= 18 {
        let factor = 10u128
            .checked_pow((18 - round.decimals) as u32)
            .ok_or(EngineError::Overflow)?;
        raw.checked_mul(factor).ok_or(EngineError::Overflow)
    } else {
        let factor = 10u128
            .checked_pow((round.decimals - 18) as u32)
            .ok_or(EngineError::Overflow)?;
        Ok(raw / factor)
    }
}

/// Settable price source for tests and local operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPriceSource {
    answer: i128,
    decimals: u8,
    round_id: u64,
}

impl FixedPriceSource {
    pub fn new(answer: i128, decimals: u8) -> Self {
        Self {
            answer,
            decimals,
            round_id: 1,
        }
    }

    /// Publish a new answer as a fresh round.
    pub fn set_answer(&mut self, answer: i128) {
        self.answer = answer;
        self.round_id += 1;
    }

    pub fn answer(&self) -> i128 {
        self.answer
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }
}

impl PriceSource for FixedPriceSource {
    fn latest_round(&self) -> Result<PriceRound> {
        Ok(PriceRound {
            round_id: self.round_id,
            answer: self.answer,
            started_at: 0,
            updated_at: 0,
            answered_in_round: self.round_id,
            decimals: self.decimals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::PRECISION;

    #[test]
    fn normalizes_eight_decimal_feed() {
        // $2000 with 8 decimals, the shape of the usual aggregator feed
        let source = FixedPriceSource::new(2_000_00000000, 8);
        assert_eq!(normalize_price(&source).unwrap(), 2_000 * PRECISION);
    }

    #[test]
    fn normalizes_high_precision_feed_down() {
        let source = FixedPriceSource::new(1_500_000_000_000_000_000_000, 21);
        assert_eq!(normalize_price(&source).unwrap(), 1_500_000_000_000_000_000);
    }

    #[test]
    fn rejects_non_positive_answers() {
        let source = FixedPriceSource::new(0, 8);
        assert_eq!(normalize_price(&source), Err(EngineError::InvalidPrice));

        let source = FixedPriceSource::new(-1, 8);
        assert_eq!(normalize_price(&source), Err(EngineError::InvalidPrice));
    }

    #[test]
    fn rejects_rounds_answered_behind() {
        struct Behind;
        impl PriceSource for Behind {
            fn latest_round(&self) -> Result<PriceRound> {
                Ok(PriceRound {
                    round_id: 7,
                    answer: 1,
                    started_at: 0,
                    updated_at: 0,
                    answered_in_round: 6,
                    decimals: 8,
                })
            }
        }
        assert_eq!(normalize_price(&Behind), Err(EngineError::StaleRound));
    }
}
