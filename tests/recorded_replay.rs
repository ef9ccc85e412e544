//! Replaying a recorded claim through the full pipeline

use btcdelay::{
    build_proof_package, ClaimEvaluator, ClaimOutcome, ClaimRequest, DelayConfig,
    InclusionVerifier, PolicyConfig, RawMerkleProof, ReasonCode, RecordedClaim, VerifierOutcome,
    VerifyError,
};

fn fixture() -> RecordedClaim {
    RecordedClaim::from_file(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/genesis_claim.json"
    ))
    .unwrap()
}

fn request(claim: &RecordedClaim, broadcast_height: Option<u64>) -> ClaimRequest {
    ClaimRequest {
        txid: claim.txid.clone(),
        user_broadcast_height: broadcast_height,
        policy: PolicyConfig::default(),
    }
}

#[tokio::test]
async fn test_genesis_replay_has_no_delay() {
    let claim = fixture();
    let req = request(&claim, claim.broadcast_height);
    let evaluator = ClaimEvaluator::new(claim.clone(), claim, DelayConfig::default());

    let report = evaluator.evaluate(&req).await.unwrap();

    // Zero-fee heuristic wants 500 blocks of wait but heights stop at 0
    assert_eq!(report.analysis.reason_code, ReasonCode::LowFeeHeuristic);
    assert_eq!(report.analysis.estimated_broadcast_height, 0);
    assert_eq!(report.analysis.delay_blocks, 0);
    assert_eq!(report.confirmations, 101);
    assert_eq!(
        report.outcome(),
        ClaimOutcome::Rejected("delay below threshold (0 blocks, 35 required)".to_string())
    );
}

#[tokio::test]
async fn test_report_serializes_for_cli() {
    let claim = fixture();
    let req = request(&claim, None);
    let evaluator = ClaimEvaluator::new(claim.clone(), claim, DelayConfig::default());

    let report = evaluator.evaluate(&req).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["stage"], "decided");
    assert_eq!(json["proof"]["tx_hash"], req.txid);
    assert_eq!(json["proof"]["proof"]["tree_depth"], 0);
    assert_eq!(json["analysis"]["reason_code"], "low_fee_heuristic");
    assert_eq!(json["verdict"]["rejection"]["kind"], "delay_below_threshold");
}

#[tokio::test]
async fn test_recorded_rejection_from_verifier() {
    let mut claim = fixture();
    claim.verifier = VerifierOutcome::NotIncluded {
        reason: "tx not at position 0".to_string(),
    };
    let req = request(&claim, None);
    let evaluator = ClaimEvaluator::new(claim.clone(), claim, DelayConfig::default());

    let failure = evaluator.evaluate(&req).await.unwrap_err();
    assert!(matches!(failure.error, VerifyError::NotMined(_)));
}

#[test]
fn test_missing_recording_file() {
    let err = RecordedClaim::from_file("/nonexistent/claim.json").unwrap_err();
    assert!(matches!(err, VerifyError::DataSource(_)));
}

#[tokio::test]
async fn test_recorded_verifier_checks_package_position() {
    let claim = fixture();
    let package = |position| {
        build_proof_package(
            &claim.txid,
            &claim.tx_hex,
            0,
            &claim.header_hex,
            &RawMerkleProof {
                block_height: 0,
                position,
                sibling_hashes: vec![],
            },
        )
        .unwrap()
    };

    let outcome = claim.verify_inclusion(&package(0)).await.unwrap();
    assert!(matches!(outcome, VerifierOutcome::Included { .. }));

    let outcome = claim.verify_inclusion(&package(3)).await.unwrap();
    assert_eq!(
        outcome,
        VerifierOutcome::NotIncluded {
            reason: "no transaction recorded at position 3".to_string()
        }
    );
}
