//! Mock homomorphic evaluator.
//!
//! Stands in for the encryption runtime during local operation and tests:
//! plaintexts live in a private table, and everything the engine ever sees
//! is a fresh sha256-derived handle. Combinators evaluate over the table and
//! return new handles, which is exactly the shape of the real runtime's
//! select/compare surface.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use graze_engine::{CiphertextHandle, FheEvaluator};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MockFhe {
    plaintexts: HashMap<CiphertextHandle, u128>,
    counter: u64,
}

impl MockFhe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client-side sealing: encrypt a secret bid value.
    pub fn encrypt(&mut self, value: u128) -> CiphertextHandle {
        self.fresh(b"encrypt", value)
    }

    /// Authority-side opening. `None` for handles this runtime never issued.
    pub fn reveal(&self, handle: &CiphertextHandle) -> Option<u128> {
        self.plaintexts.get(handle).copied()
    }

    fn fresh(&mut self, tag: &[u8], value: u128) -> CiphertextHandle {
        self.counter += 1;
        let mut hasher = Sha256::new();
        hasher.update(b"graze/mock-fhe/");
        hasher.update(tag);
        hasher.update(self.counter.to_le_bytes());
        hasher.update(value.to_le_bytes());
        let handle = CiphertextHandle(hasher.finalize().into());
        self.plaintexts.insert(handle, value);
        handle
    }

    fn value_of(&self, handle: &CiphertextHandle) -> u128 {
        // unknown handles decrypt to zero rather than aborting the fold
        self.reveal(handle).unwrap_or(0)
    }
}

impl FheEvaluator for MockFhe {
    fn trivial_encrypt(&mut self, value: u128) -> CiphertextHandle {
        self.fresh(b"trivial", value)
    }

    fn gt(&mut self, lhs: &CiphertextHandle, rhs: &CiphertextHandle) -> CiphertextHandle {
        let result = (self.value_of(lhs) > self.value_of(rhs)) as u128;
        self.fresh(b"gt", result)
    }

    fn select(
        &mut self,
        cond: &CiphertextHandle,
        on_true: &CiphertextHandle,
        on_false: &CiphertextHandle,
    ) -> CiphertextHandle {
        let value = if self.value_of(cond) != 0 {
            self.value_of(on_true)
        } else {
            self.value_of(on_false)
        };
        self.fresh(b"select", value)
    }
}
