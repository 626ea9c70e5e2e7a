//! Call context passed by the embedding runtime.

use crate::Address;

/// Context provided by the runtime for each call.
#[derive(Clone, Copy, Debug)]
pub struct CallContext {
    /// Sender of the call
    pub sender: Address,
    /// Current timestamp (seconds)
    pub timestamp: u64,
    /// Native value attached to the call (collateral deposits)
    pub value: u128,
}

impl CallContext {
    pub fn new(sender: Address, timestamp: u64) -> Self {
        Self {
            sender,
            timestamp,
            value: 0,
        }
    }

    pub fn with_value(sender: Address, timestamp: u64, value: u128) -> Self {
        Self {
            sender,
            timestamp,
            value,
        }
    }
}
