//! Esplora Payload Decoding
//!
//! One schema per explorer payload, decoded once at the edge into the typed
//! entities the core works with. Only the Esplora field spellings are
//! accepted. Fetching is the caller's job.

use serde::{Deserialize, Serialize};

use crate::common::error::{Result, VerifyError};
use crate::proof::RawMerkleProof;
use crate::types::TransactionRecord;

/// `GET /tx/:txid/status`, also embedded in `GET /tx/:txid`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EsploraTxStatus {
    pub confirmed: bool,
    #[serde(default)]
    pub block_height: Option<u64>,
    #[serde(default)]
    pub block_hash: Option<String>,
}

/// Subset of `GET /tx/:txid` the core reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EsploraTransaction {
    pub txid: String,
    pub status: EsploraTxStatus,
    pub fee: u64,
    pub size: u64,
    pub weight: u64,
}

/// `GET /tx/:txid/merkle-proof`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EsploraMerkleProof {
    pub block_height: u64,
    pub pos: u64,
    pub merkle: Vec<String>,
}

impl TryFrom<EsploraTransaction> for TransactionRecord {
    type Error = VerifyError;

    fn try_from(tx: EsploraTransaction) -> Result<Self> {
        let (block_height, block_hash) = if tx.status.confirmed {
            (
                tx.status
                    .block_height
                    .ok_or(VerifyError::MissingField("status.block_height"))?,
                tx.status
                    .block_hash
                    .ok_or(VerifyError::MissingField("status.block_hash"))?,
            )
        } else {
            (0, String::new())
        };

        Ok(TransactionRecord {
            txid: tx.txid,
            confirmed: tx.status.confirmed,
            block_height,
            block_hash,
            fee_sats: tx.fee,
            size_bytes: tx.size,
            weight_units: tx.weight,
        })
    }
}

impl From<EsploraMerkleProof> for RawMerkleProof {
    fn from(proof: EsploraMerkleProof) -> Self {
        RawMerkleProof {
            block_height: proof.block_height,
            position: proof.pos,
            sibling_hashes: proof.merkle,
        }
    }
}

/// Decode a `GET /tx/:txid` response
pub fn decode_transaction_record(json: &str) -> Result<TransactionRecord> {
    let tx: EsploraTransaction = serde_json::from_str(json)?;
    tx.try_into()
}

/// Decode a `GET /tx/:txid/merkle-proof` response
pub fn decode_merkle_proof(json: &str) -> Result<RawMerkleProof> {
    let proof: EsploraMerkleProof = serde_json::from_str(json)?;
    Ok(proof.into())
}
