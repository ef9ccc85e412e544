//! Shared Types
//!
//! Transaction metadata as supplied by the external data source. Consumed
//! read-only by the core.

use serde::{Deserialize, Serialize};

/// Weight units per virtual byte
pub const WITNESS_SCALE_FACTOR: u64 = 4;

/// Confirmation metadata for one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Display-order txid
    pub txid: String,
    pub confirmed: bool,
    /// 0 while unconfirmed
    pub block_height: u64,
    /// Empty while unconfirmed
    pub block_hash: String,
    pub fee_sats: u64,
    pub size_bytes: u64,
    pub weight_units: u64,
}

impl TransactionRecord {
    /// Virtual size: weight / 4 rounded up, or raw size if weight is unknown
    pub fn vsize(&self) -> u64 {
        if self.weight_units > 0 {
            self.weight_units.div_ceil(WITNESS_SCALE_FACTOR)
        } else {
            self.size_bytes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(size_bytes: u64, weight_units: u64) -> TransactionRecord {
        TransactionRecord {
            txid: "00".repeat(32),
            confirmed: true,
            block_height: 924_282,
            block_hash: "00".repeat(32),
            fee_sats: 1_000,
            size_bytes,
            weight_units,
        }
    }

    #[test]
    fn test_vsize_from_weight() {
        assert_eq!(record(222, 561).vsize(), 141);
        assert_eq!(record(222, 560).vsize(), 140);
    }

    #[test]
    fn test_vsize_falls_back_to_size() {
        assert_eq!(record(252, 0).vsize(), 252);
    }
}
