//! Claim evaluation against mocked collaborators
//!
//! The genesis coinbase and header stand in for a real claim; the mocks place
//! them at height 1000 so delays can be computed in both directions.

use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::eq;

use btcdelay::{
    sha256d, ChainDataSource, ClaimEvaluator, ClaimOutcome, ClaimRequest, ClaimStage,
    DelayConfig, ErrorKind, InclusionVerifier, PolicyConfig, ProofPackage, RawMerkleProof,
    ReasonCode, Result, TransactionRecord, VerifierOutcome, VerifyError,
};

const GENESIS_COINBASE: &str = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";
const GENESIS_TXID: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";
const GENESIS_HEADER: &str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c";
const GENESIS_HASH: &str = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";

const INCLUSION_HEIGHT: u64 = 1_000;

mock! {
    pub Source {}

    #[async_trait]
    impl ChainDataSource for Source {
        async fn transaction_hex(&self, txid: &str) -> Result<String>;
        async fn transaction_record(&self, txid: &str) -> Result<TransactionRecord>;
        async fn merkle_proof(&self, txid: &str) -> Result<RawMerkleProof>;
        async fn block_header_hex(&self, height: u64) -> Result<String>;
        async fn tip_height(&self) -> Result<u64>;
    }
}

mock! {
    pub Verifier {}

    #[async_trait]
    impl InclusionVerifier for Verifier {
        async fn verify_inclusion(&self, package: &ProofPackage) -> Result<VerifierOutcome>;
    }
}

fn genesis_digest() -> [u8; 32] {
    sha256d(&hex::decode(GENESIS_COINBASE).unwrap())
}

fn record(confirmed: bool) -> TransactionRecord {
    TransactionRecord {
        txid: GENESIS_TXID.to_string(),
        confirmed,
        block_height: if confirmed { INCLUSION_HEIGHT } else { 0 },
        block_hash: if confirmed {
            GENESIS_HASH.to_string()
        } else {
            String::new()
        },
        fee_sats: 0,
        size_bytes: 204,
        weight_units: 816,
    }
}

/// A source that serves the genesis coinbase as mined at [`INCLUSION_HEIGHT`]
fn source(record: TransactionRecord, proof_height: u64, tip: u64) -> MockSource {
    let mut source = MockSource::new();
    source
        .expect_transaction_record()
        .withf(|txid| txid == GENESIS_TXID)
        .returning(move |_| Ok(record.clone()));
    source
        .expect_transaction_hex()
        .returning(|_| Ok(GENESIS_COINBASE.to_string()));
    source.expect_merkle_proof().returning(move |_| {
        Ok(RawMerkleProof {
            block_height: proof_height,
            position: 0,
            sibling_hashes: vec![],
        })
    });
    source
        .expect_block_header_hex()
        .with(eq(proof_height))
        .returning(|_| Ok(GENESIS_HEADER.to_string()));
    source.expect_tip_height().returning(move || Ok(tip));
    source
}

fn verifier(outcome: VerifierOutcome) -> MockVerifier {
    let mut verifier = MockVerifier::new();
    verifier
        .expect_verify_inclusion()
        .times(1)
        .returning(move |_| Ok(outcome.clone()));
    verifier
}

fn unused_verifier() -> MockVerifier {
    let mut verifier = MockVerifier::new();
    verifier.expect_verify_inclusion().never();
    verifier
}

fn request(broadcast_height: Option<u64>) -> ClaimRequest {
    ClaimRequest {
        txid: GENESIS_TXID.to_string(),
        user_broadcast_height: broadcast_height,
        policy: PolicyConfig::default(),
    }
}

fn included() -> VerifierOutcome {
    VerifierOutcome::Included {
        tx_digest: genesis_digest(),
    }
}

#[tokio::test]
async fn test_delayed_claim_is_accepted() {
    let evaluator = ClaimEvaluator::new(
        source(record(true), INCLUSION_HEIGHT, 1_010),
        verifier(included()),
        DelayConfig::default(),
    );

    let report = evaluator.evaluate(&request(Some(950))).await.unwrap();

    assert_eq!(report.stage, ClaimStage::Decided);
    assert_eq!(report.outcome(), ClaimOutcome::Accepted);
    assert_eq!(report.confirmations, 11);
    assert_eq!(report.analysis.delay_blocks, 50);
    assert_eq!(report.analysis.delay_minutes, 500);
    assert_eq!(report.analysis.reason_code, ReasonCode::UserProvided);
    assert!(report.analysis.is_delayed);
    assert_eq!(report.proof.block_height, INCLUSION_HEIGHT);
    assert_eq!(report.proof.block_header().block_hash_hex(), GENESIS_HASH);
    assert_eq!(report.correlation_id.len(), 32);
}

#[tokio::test]
async fn test_short_delay_is_rejected() {
    let evaluator = ClaimEvaluator::new(
        source(record(true), INCLUSION_HEIGHT, 1_010),
        verifier(included()),
        DelayConfig::default(),
    );

    let report = evaluator.evaluate(&request(Some(990))).await.unwrap();

    assert_eq!(
        report.outcome(),
        ClaimOutcome::Rejected("delay below threshold (10 blocks, 35 required)".to_string())
    );
}

#[tokio::test]
async fn test_low_fee_heuristic_without_user_height() {
    let evaluator = ClaimEvaluator::new(
        source(record(true), INCLUSION_HEIGHT, 1_010),
        verifier(included()),
        DelayConfig::default(),
    );

    // Zero fee: wait = max(35, floor(50 / 0.1)) = 500
    let report = evaluator.evaluate(&request(None)).await.unwrap();

    assert_eq!(report.analysis.reason_code, ReasonCode::LowFeeHeuristic);
    assert_eq!(report.analysis.estimated_broadcast_height, 500);
    assert!(report.analysis.is_low_fee);
    assert_eq!(report.outcome(), ClaimOutcome::Accepted);
}

#[tokio::test]
async fn test_too_few_confirmations_is_rejected() {
    let evaluator = ClaimEvaluator::new(
        source(record(true), INCLUSION_HEIGHT, 1_002),
        verifier(included()),
        DelayConfig::default(),
    );

    let report = evaluator.evaluate(&request(Some(900))).await.unwrap();

    assert_eq!(
        report.outcome(),
        ClaimOutcome::Rejected("insufficient confirmations (3/6 required)".to_string())
    );
}

#[tokio::test]
async fn test_not_included_is_not_mined() {
    let evaluator = ClaimEvaluator::new(
        source(record(true), INCLUSION_HEIGHT, 1_010),
        verifier(VerifierOutcome::NotIncluded {
            reason: "merkle root mismatch".to_string(),
        }),
        DelayConfig::default(),
    );

    let failure = evaluator.evaluate(&request(Some(950))).await.unwrap_err();

    assert_eq!(failure.completed, Some(ClaimStage::ProofBuilt));
    assert_eq!(
        failure.error,
        VerifyError::NotMined("merkle root mismatch".to_string())
    );
    assert!(!failure.error.is_retryable());
}

#[tokio::test]
async fn test_verifier_digest_mismatch() {
    let evaluator = ClaimEvaluator::new(
        source(record(true), INCLUSION_HEIGHT, 1_010),
        verifier(VerifierOutcome::Included {
            tx_digest: [0x11; 32],
        }),
        DelayConfig::default(),
    );

    let failure = evaluator.evaluate(&request(Some(950))).await.unwrap_err();

    assert_eq!(failure.completed, Some(ClaimStage::ProofBuilt));
    assert_eq!(failure.error.kind(), ErrorKind::CrossCheck);
    assert!(matches!(
        failure.error,
        VerifyError::TxidMismatch { ref computed, .. } if computed == &"11".repeat(32)
    ));
}

#[tokio::test]
async fn test_unconfirmed_stops_before_verifier() {
    let evaluator = ClaimEvaluator::new(
        source(record(false), 0, 1_010),
        unused_verifier(),
        DelayConfig::default(),
    );

    let failure = evaluator.evaluate(&request(Some(950))).await.unwrap_err();

    assert_eq!(failure.completed, Some(ClaimStage::Fetched));
    assert_eq!(failure.error.kind(), ErrorKind::NotMined);
}

#[tokio::test]
async fn test_proof_height_mismatch() {
    let evaluator = ClaimEvaluator::new(
        source(record(true), INCLUSION_HEIGHT - 1, 1_010),
        unused_verifier(),
        DelayConfig::default(),
    );

    let failure = evaluator.evaluate(&request(Some(950))).await.unwrap_err();

    assert_eq!(failure.completed, Some(ClaimStage::Fetched));
    assert!(matches!(failure.error, VerifyError::InvalidProof(_)));
}

#[tokio::test]
async fn test_wrong_transaction_bytes_fail_cross_check() {
    let mut fresh = MockSource::new();
    fresh
        .expect_transaction_record()
        .returning(|_| Ok(record(true)));
    // The coinbase with its lock time bumped hashes to a different txid
    fresh.expect_transaction_hex().returning(|_| {
        Ok(format!(
            "{}01000000",
            &GENESIS_COINBASE[..GENESIS_COINBASE.len() - 8]
        ))
    });
    fresh.expect_merkle_proof().returning(|_| {
        Ok(RawMerkleProof {
            block_height: INCLUSION_HEIGHT,
            position: 0,
            sibling_hashes: vec![],
        })
    });
    fresh
        .expect_block_header_hex()
        .returning(|_| Ok(GENESIS_HEADER.to_string()));
    fresh.expect_tip_height().returning(|| Ok(1_010));

    let evaluator = ClaimEvaluator::new(fresh, unused_verifier(), DelayConfig::default());
    let failure = evaluator.evaluate(&request(Some(950))).await.unwrap_err();

    assert_eq!(failure.completed, Some(ClaimStage::Validated));
    assert!(matches!(
        failure.error,
        VerifyError::TxidMismatch { ref claimed, .. } if claimed == GENESIS_TXID
    ));
}

#[tokio::test]
async fn test_malformed_txid_never_fetches() {
    let evaluator = ClaimEvaluator::new(MockSource::new(), unused_verifier(), DelayConfig::default());

    let mut bad = request(None);
    bad.txid = "abc".to_string();
    let failure = evaluator.evaluate(&bad).await.unwrap_err();

    assert_eq!(failure.completed, None);
    assert!(matches!(failure.error, VerifyError::InvalidTxid(_)));
}

#[tokio::test]
async fn test_data_source_error_is_retryable() {
    let mut source = MockSource::new();
    source
        .expect_transaction_record()
        .returning(|_| Err(VerifyError::data_source("explorer returned 503")));

    let evaluator = ClaimEvaluator::new(source, unused_verifier(), DelayConfig::default());
    let failure = evaluator.evaluate(&request(None)).await.unwrap_err();

    assert_eq!(failure.completed, None);
    assert!(failure.error.is_retryable());
    assert_eq!(failure.error.error_code(), "DATA_SOURCE_ERROR");
}

#[tokio::test]
async fn test_prefixed_uppercase_txid_is_accepted() {
    let evaluator = ClaimEvaluator::new(
        source(record(true), INCLUSION_HEIGHT, 1_010),
        verifier(included()),
        DelayConfig::default(),
    );

    let mut claim = request(Some(950));
    claim.txid = format!("0x{}", GENESIS_TXID.to_uppercase());
    let report = evaluator.evaluate(&claim).await.unwrap();

    assert_eq!(report.txid, GENESIS_TXID);
    assert_eq!(report.outcome(), ClaimOutcome::Accepted);
}
