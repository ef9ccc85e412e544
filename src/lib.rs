//! btcdelay - Delay-Insurance Claim Verification
//!
//! Verification core for Bitcoin transaction-delay insurance claims:
//!
//! 1. **Proof packaging** - recompute the txid from raw bytes, reorient the
//!    explorer Merkle proof and bundle it for the inclusion verifier
//! 2. **Delay analysis** - estimate when the transaction was broadcast and
//!    how many blocks it waited
//! 3. **Eligibility** - apply the policy's confirmation and delay thresholds
//!
//! Fetching chain data and verifying inclusion are left to the collaborators
//! behind [`ChainDataSource`] and [`InclusionVerifier`].

pub mod claim;
pub mod codec;
pub mod common;
pub mod delay;
pub mod eligibility;
pub mod esplora;
pub mod hash;
pub mod header;
pub mod proof;
pub mod recorded;
pub mod types;
pub mod witness;

// Re-exports: infrastructure
pub use common::{AppConfig, DelayConfig, ErrorKind, PolicyConfig, Result, VerifyError};

// Re-exports: byte-level checks
pub use hash::{compute_txid, double_hash, sha256d};
pub use header::BlockHeader;
pub use witness::strip_witness_data;

// Re-exports: proof packaging
pub use proof::{build_proof_package, canonicalize_proof, CanonicalProof, ProofPackage, RawMerkleProof};

// Re-exports: delay and eligibility
pub use delay::{
    analyze_delay, classify_fee_rate, compute_delay, estimate_broadcast_height, DelayAnalysis,
    DelayInput, ReasonCode,
};
pub use eligibility::{decide, decide_for_policy, EligibilityVerdict, Rejection};

// Re-exports: pipeline
pub use claim::{
    ChainDataSource, ClaimEvaluator, ClaimFailure, ClaimOutcome, ClaimReport, ClaimRequest,
    ClaimStage, InclusionVerifier, VerifierOutcome,
};
pub use recorded::RecordedClaim;
pub use types::TransactionRecord;
