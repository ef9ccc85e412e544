//! Claim Evaluation Pipeline
//!
//! Drives one claim through its stages:
//! fetched → validated → proof_built → verifier_invoked → delay_computed → decided
//!
//! Data comes from a [`ChainDataSource`] and inclusion is confirmed by an
//! [`InclusionVerifier`]; both are external collaborators. Each is called at
//! most once per stage. Any error ends the evaluation; retrying means
//! running the whole pipeline again with fresh data.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::codec::{bytes_to_hex, is_valid_hash32, is_valid_header80, strip_0x};
use crate::common::config::{DelayConfig, PolicyConfig};
use crate::common::error::{Result, VerifyError};
use crate::common::logging::{generate_correlation_id, log_claim_event, log_security_event};
use crate::delay::{analyze_delay, DelayAnalysis, DelayInput};
use crate::eligibility::{confirmations, decide_for_policy, EligibilityVerdict};
use crate::proof::{build_proof_package, ProofPackage, RawMerkleProof};
use crate::types::TransactionRecord;

/// Source of raw chain data (a block explorer in production)
#[async_trait]
pub trait ChainDataSource: Send + Sync {
    /// Full serialization, witness included
    async fn transaction_hex(&self, txid: &str) -> Result<String>;

    async fn transaction_record(&self, txid: &str) -> Result<TransactionRecord>;

    async fn merkle_proof(&self, txid: &str) -> Result<RawMerkleProof>;

    /// 80-byte header of the block at `height`
    async fn block_header_hex(&self, height: u64) -> Result<String>;

    async fn tip_height(&self) -> Result<u64>;
}

/// What the inclusion verifier reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifierOutcome {
    /// Transaction found; digest in internal byte order
    Included {
        #[serde(
            serialize_with = "crate::codec::serialize_hex",
            deserialize_with = "crate::codec::deserialize_hash32"
        )]
        tx_digest: [u8; 32],
    },
    NotIncluded { reason: String },
}

/// The authoritative "was it mined" check
#[async_trait]
pub trait InclusionVerifier: Send + Sync {
    async fn verify_inclusion(&self, package: &ProofPackage) -> Result<VerifierOutcome>;
}

/// Pipeline stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStage {
    Fetched,
    Validated,
    ProofBuilt,
    VerifierInvoked,
    DelayComputed,
    Decided,
}

impl std::fmt::Display for ClaimStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetched => write!(f, "fetched"),
            Self::Validated => write!(f, "validated"),
            Self::ProofBuilt => write!(f, "proof_built"),
            Self::VerifierInvoked => write!(f, "verifier_invoked"),
            Self::DelayComputed => write!(f, "delay_computed"),
            Self::Decided => write!(f, "decided"),
        }
    }
}

/// One claim to evaluate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub txid: String,
    /// Claimant-supplied broadcast height, unverified
    pub user_broadcast_height: Option<u64>,
    pub policy: PolicyConfig,
}

/// Terminal outcome of a completed evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Accepted,
    Rejected(String),
}

/// Everything a completed evaluation produced
#[derive(Debug, Clone, Serialize)]
pub struct ClaimReport {
    pub correlation_id: String,
    pub txid: String,
    pub stage: ClaimStage,
    pub proof: ProofPackage,
    pub confirmations: u64,
    pub analysis: DelayAnalysis,
    pub verdict: EligibilityVerdict,
}

impl ClaimReport {
    pub fn outcome(&self) -> ClaimOutcome {
        match &self.verdict.rejection_reason {
            None if self.verdict.is_eligible => ClaimOutcome::Accepted,
            reason => ClaimOutcome::Rejected(reason.clone().unwrap_or_default()),
        }
    }
}

/// A failed evaluation and the last stage it completed
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimFailure {
    pub correlation_id: String,
    pub completed: Option<ClaimStage>,
    pub error: VerifyError,
}

impl std::fmt::Display for ClaimFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.completed {
            Some(stage) => write!(f, "claim failed after {}: {}", stage, self.error),
            None => write!(f, "claim failed before fetch: {}", self.error),
        }
    }
}

impl std::error::Error for ClaimFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Everything fetched for one claim
struct Evidence {
    tx_hex: String,
    record: TransactionRecord,
    proof: RawMerkleProof,
    header_hex: String,
    tip_height: u64,
}

struct Progress<'a> {
    correlation_id: &'a str,
    txid: &'a str,
    completed: Option<ClaimStage>,
}

impl Progress<'_> {
    fn complete(&mut self, stage: ClaimStage) {
        self.completed = Some(stage);
        tracing::debug!(
            target: "btcdelay::claim",
            correlation_id = self.correlation_id,
            txid = self.txid,
            %stage,
            "stage complete"
        );
    }
}

/// Runs claims against a data source and an inclusion verifier
pub struct ClaimEvaluator<D, V> {
    source: D,
    verifier: V,
    delay: DelayConfig,
}

impl<D: ChainDataSource, V: InclusionVerifier> ClaimEvaluator<D, V> {
    pub fn new(source: D, verifier: V, delay: DelayConfig) -> Self {
        Self {
            source,
            verifier,
            delay,
        }
    }

    /// Evaluate one claim end to end
    pub async fn evaluate(&self, request: &ClaimRequest) -> std::result::Result<ClaimReport, ClaimFailure> {
        let correlation_id = generate_correlation_id();
        let txid = strip_0x(&request.txid).to_lowercase();
        let mut progress = Progress {
            correlation_id: &correlation_id,
            txid: &txid,
            completed: None,
        };

        log_claim_event("claim_started", &correlation_id, &txid, "started", None);

        match self.run(request, &txid, &mut progress).await {
            Ok(report) => {
                let event = if report.verdict.is_eligible {
                    "claim_accepted"
                } else {
                    "claim_rejected"
                };
                log_claim_event(event, &correlation_id, &txid, "decided", None);
                Ok(report)
            }
            Err(error) => {
                let stage = progress
                    .completed
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "started".to_string());
                log_claim_event(
                    "claim_failed",
                    &correlation_id,
                    &txid,
                    &stage,
                    Some((error.error_code(), &error.to_string())),
                );
                Err(ClaimFailure {
                    completed: progress.completed,
                    correlation_id,
                    error,
                })
            }
        }
    }

    async fn run(&self, request: &ClaimRequest, txid: &str, progress: &mut Progress<'_>) -> Result<ClaimReport> {
        if !is_valid_hash32(txid) {
            return Err(VerifyError::InvalidTxid(format!(
                "expected 64 hex characters, got {:?}",
                request.txid
            )));
        }

        let evidence = self.fetch(txid).await?;
        progress.complete(ClaimStage::Fetched);

        validate(txid, &evidence)?;
        progress.complete(ClaimStage::Validated);

        let package = build_proof_package(
            txid,
            &evidence.tx_hex,
            evidence.record.block_height,
            &evidence.header_hex,
            &evidence.proof,
        )
        .inspect_err(|e| {
            if let VerifyError::TxidMismatch { claimed, computed } = e {
                log_security_event(
                    "txid_mismatch",
                    serde_json::json!({ "claimed": claimed, "computed": computed }),
                    Some(progress.correlation_id),
                );
            }
        })?;
        progress.complete(ClaimStage::ProofBuilt);

        match self.verifier.verify_inclusion(&package).await? {
            VerifierOutcome::Included { tx_digest } => {
                if tx_digest != package.expected_digest() {
                    let mut display = tx_digest;
                    display.reverse();
                    let computed = bytes_to_hex(&display);
                    log_security_event(
                        "verifier_digest_mismatch",
                        serde_json::json!({ "claimed": txid, "verifier": computed }),
                        Some(progress.correlation_id),
                    );
                    return Err(VerifyError::TxidMismatch {
                        claimed: txid.to_string(),
                        computed,
                    });
                }
            }
            VerifierOutcome::NotIncluded { reason } => {
                return Err(VerifyError::NotMined(reason));
            }
        }
        progress.complete(ClaimStage::VerifierInvoked);

        let inclusion_height = evidence.record.block_height;
        let confirmations = confirmations(evidence.tip_height, inclusion_height);
        let analysis = analyze_delay(
            &DelayInput {
                inclusion_height,
                user_broadcast_height: request.user_broadcast_height,
                fee_sats: evidence.record.fee_sats,
                vsize_bytes: evidence.record.vsize(),
            },
            request.policy.delay_threshold,
            &self.delay,
        )?;
        progress.complete(ClaimStage::DelayComputed);

        let verdict = decide_for_policy(confirmations, analysis.delay_blocks, &request.policy);
        progress.complete(ClaimStage::Decided);

        Ok(ClaimReport {
            correlation_id: progress.correlation_id.to_string(),
            txid: txid.to_string(),
            stage: ClaimStage::Decided,
            proof: package,
            confirmations,
            analysis,
            verdict,
        })
    }

    async fn fetch(&self, txid: &str) -> Result<Evidence> {
        let record = self.source.transaction_record(txid).await?;
        let tx_hex = self.source.transaction_hex(txid).await?;
        let proof = self.source.merkle_proof(txid).await?;
        let header_hex = self.source.block_header_hex(proof.block_height).await?;
        let tip_height = self.source.tip_height().await?;

        Ok(Evidence {
            tx_hex,
            record,
            proof,
            header_hex,
            tip_height,
        })
    }
}

/// Consistency checks between the fetched pieces
fn validate(txid: &str, evidence: &Evidence) -> Result<()> {
    let record = &evidence.record;

    if !strip_0x(&record.txid).eq_ignore_ascii_case(txid) {
        return Err(VerifyError::data_source(format!(
            "requested {} but received record for {}",
            txid, record.txid
        )));
    }

    if !record.confirmed {
        return Err(VerifyError::NotMined("transaction is unconfirmed".to_string()));
    }

    if record.block_height != evidence.proof.block_height {
        return Err(VerifyError::InvalidProof(format!(
            "proof is for height {}, transaction confirmed at {}",
            evidence.proof.block_height, record.block_height
        )));
    }

    if !is_valid_header80(&evidence.header_hex) {
        return Err(VerifyError::InvalidHeader(format!(
            "expected 160 hex characters, got {}",
            strip_0x(&evidence.header_hex).len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(ClaimStage::Fetched < ClaimStage::Validated);
        assert!(ClaimStage::VerifierInvoked < ClaimStage::DelayComputed);
        assert_eq!(ClaimStage::ProofBuilt.to_string(), "proof_built");
    }

    #[test]
    fn test_verifier_outcome_json() {
        let json = format!(r#"{{"status":"included","tx_digest":"{}"}}"#, "ab".repeat(32));
        let outcome: VerifierOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(
            outcome,
            VerifierOutcome::Included {
                tx_digest: [0xab; 32]
            }
        );

        let json = r#"{"status":"not_included","reason":"position mismatch"}"#;
        let outcome: VerifierOutcome = serde_json::from_str(json).unwrap();
        assert!(matches!(outcome, VerifierOutcome::NotIncluded { .. }));
    }

    #[test]
    fn test_failure_display() {
        let failure = ClaimFailure {
            correlation_id: "c".to_string(),
            completed: Some(ClaimStage::ProofBuilt),
            error: VerifyError::NotMined("not at position 3".to_string()),
        };
        assert_eq!(
            failure.to_string(),
            "claim failed after proof_built: transaction not mined: not at position 3"
        );
    }
}
