//! Recorded Claims
//!
//! A claim captured as one JSON document: the explorer payloads, the raw
//! transaction and header, and what the inclusion verifier answered. Serves
//! as both collaborators so a claim can be re-assessed offline.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::claim::{ChainDataSource, InclusionVerifier, VerifierOutcome};
use crate::codec::strip_0x;
use crate::common::error::{Result, VerifyError};
use crate::esplora::{EsploraMerkleProof, EsploraTransaction};
use crate::proof::{ProofPackage, RawMerkleProof};
use crate::types::TransactionRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedClaim {
    pub txid: String,
    /// Full transaction hex, witness included
    pub tx_hex: String,
    pub header_hex: String,
    pub transaction: EsploraTransaction,
    pub merkle_proof: EsploraMerkleProof,
    pub tip_height: u64,
    #[serde(default)]
    pub broadcast_height: Option<u64>,
    pub verifier: VerifierOutcome,
}

impl RecordedClaim {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| VerifyError::data_source(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    fn check_txid(&self, txid: &str) -> Result<()> {
        if strip_0x(&self.txid).eq_ignore_ascii_case(strip_0x(txid)) {
            Ok(())
        } else {
            Err(VerifyError::data_source(format!("no recording for {}", txid)))
        }
    }
}

#[async_trait]
impl ChainDataSource for RecordedClaim {
    async fn transaction_hex(&self, txid: &str) -> Result<String> {
        self.check_txid(txid)?;
        Ok(self.tx_hex.clone())
    }

    async fn transaction_record(&self, txid: &str) -> Result<TransactionRecord> {
        self.check_txid(txid)?;
        self.transaction.clone().try_into()
    }

    async fn merkle_proof(&self, txid: &str) -> Result<RawMerkleProof> {
        self.check_txid(txid)?;
        Ok(self.merkle_proof.clone().into())
    }

    async fn block_header_hex(&self, height: u64) -> Result<String> {
        if height != self.merkle_proof.block_height {
            return Err(VerifyError::data_source(format!(
                "no header recorded for height {}",
                height
            )));
        }
        Ok(self.header_hex.clone())
    }

    async fn tip_height(&self) -> Result<u64> {
        Ok(self.tip_height)
    }
}

#[async_trait]
impl InclusionVerifier for RecordedClaim {
    async fn verify_inclusion(&self, package: &ProofPackage) -> Result<VerifierOutcome> {
        let (block_height, _, _, proof) = package.verifier_args();

        if block_height != self.merkle_proof.block_height {
            return Ok(VerifierOutcome::NotIncluded {
                reason: format!("no block recorded at height {}", block_height),
            });
        }
        if proof.tx_index() != self.merkle_proof.pos {
            return Ok(VerifierOutcome::NotIncluded {
                reason: format!("no transaction recorded at position {}", proof.tx_index()),
            });
        }
        Ok(self.verifier.clone())
    }
}
