//! Inclusion Proof Packaging
//!
//! Turns explorer-style Merkle proofs into the orientation the on-chain
//! inclusion verifier expects and bundles them with the raw transaction and
//! header. The package is only produced once the claimed txid has been
//! recomputed from the transaction bytes.

use serde::{Deserialize, Serialize};

use crate::codec::{
    hex_to_bytes, is_valid_hash32, reverse_hash32, serialize_hex, serialize_hex_list,
    MAX_PROOF_DEPTH,
};
use crate::common::error::{Result, VerifyError};
use crate::common::logging::{log_core_event, EventCategory, LogLevel};
use crate::hash::{compute_txid, sha256d};
use crate::header::{decode_header_hex, BlockHeader, HEADER_LEN};
use crate::witness::strip_witness_data;

/// Merkle proof as reported by a block explorer (display byte order)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMerkleProof {
    pub block_height: u64,
    /// Transaction index within the block
    pub position: u64,
    /// Sibling hashes from leaf to root
    pub sibling_hashes: Vec<String>,
}

/// Merkle proof in verifier orientation (internal byte order)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalProof {
    tx_index: u64,
    #[serde(serialize_with = "serialize_hex_list")]
    hashes: Vec<[u8; 32]>,
    tree_depth: usize,
}

impl CanonicalProof {
    pub fn tx_index(&self) -> u64 {
        self.tx_index
    }

    pub fn hashes(&self) -> &[[u8; 32]] {
        &self.hashes
    }

    /// Always `hashes().len()`
    pub fn tree_depth(&self) -> usize {
        self.tree_depth
    }
}

/// Everything the inclusion verifier needs for one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProofPackage {
    /// Claimed txid bytes, display order
    #[serde(serialize_with = "serialize_hex")]
    pub tx_hash: [u8; 32],
    /// Non-witness serialization
    #[serde(serialize_with = "serialize_hex")]
    pub raw_tx: Vec<u8>,
    #[serde(serialize_with = "serialize_hex")]
    pub header: [u8; HEADER_LEN],
    pub proof: CanonicalProof,
    pub block_height: u64,
}

impl ProofPackage {
    /// Arguments in the order the verifier is invoked with
    pub fn verifier_args(&self) -> (u64, &[u8], &[u8; HEADER_LEN], &CanonicalProof) {
        (self.block_height, &self.raw_tx, &self.header, &self.proof)
    }

    /// Digest a successful verifier call returns (internal byte order)
    pub fn expected_digest(&self) -> [u8; 32] {
        sha256d(&self.raw_tx)
    }

    /// Parsed view of the packaged header
    pub fn block_header(&self) -> BlockHeader {
        BlockHeader::from_raw(&self.header)
    }
}

/// Convert an explorer proof into verifier orientation
pub fn canonicalize_proof(raw: &RawMerkleProof) -> Result<CanonicalProof> {
    let depth = raw.sibling_hashes.len();
    if depth > MAX_PROOF_DEPTH {
        return Err(VerifyError::ProofTooDeep {
            depth,
            max: MAX_PROOF_DEPTH,
        });
    }

    let hashes = raw
        .sibling_hashes
        .iter()
        .enumerate()
        .map(|(i, sibling)| {
            if !is_valid_hash32(sibling) {
                return Err(VerifyError::InvalidProof(format!(
                    "sibling {} is not a 32-byte hash",
                    i
                )));
            }
            Ok(reverse_hash32(sibling)?)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CanonicalProof {
        tx_index: raw.position,
        tree_depth: hashes.len(),
        hashes,
    })
}

/// Build a proof package, failing unless `full_tx_hex` hashes to `claimed_txid`
pub fn build_proof_package(
    claimed_txid: &str,
    full_tx_hex: &str,
    block_height: u64,
    header_hex: &str,
    raw_proof: &RawMerkleProof,
) -> Result<ProofPackage> {
    if !is_valid_hash32(claimed_txid) {
        return Err(VerifyError::InvalidTxid(format!(
            "expected 64 hex characters, got {:?}",
            claimed_txid
        )));
    }

    let header = decode_header_hex(header_hex)?;

    let non_witness_hex = strip_witness_data(full_tx_hex)?;
    let computed = compute_txid(&non_witness_hex)?;

    let claimed = crate::codec::strip_0x(claimed_txid).to_lowercase();
    if computed != claimed {
        return Err(VerifyError::TxidMismatch { claimed, computed });
    }

    let proof = canonicalize_proof(raw_proof)?;

    let mut tx_hash = [0u8; 32];
    tx_hash.copy_from_slice(&hex_to_bytes(&claimed)?);

    let package = ProofPackage {
        tx_hash,
        raw_tx: hex_to_bytes(&non_witness_hex)?,
        header,
        proof,
        block_height,
    };

    log_core_event(
        LogLevel::Debug,
        EventCategory::Proof,
        "proof_package_built",
        serde_json::json!({
            "txid": claimed,
            "block_height": block_height,
            "block_hash": package.block_header().block_hash_hex(),
            "tree_depth": package.proof.tree_depth(),
        }),
    );

    Ok(package)
}
