//! Delay Analysis
//!
//! Block and minute delay between broadcast and inclusion, fee-rate
//! classification, and the broadcast-height estimate used when the claimant
//! does not supply one.
//!
//! The estimate is a heuristic. [`ReasonCode`] tells the caller how much to
//! trust it; nothing here proves when a transaction was broadcast.

use serde::{Deserialize, Serialize};

use crate::common::config::DelayConfig;
use crate::common::error::{Result, VerifyError};
use crate::common::logging::{log_core_event, EventCategory, LogLevel};

/// How the broadcast height was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Supplied by the claimant, unverified
    UserProvided,
    /// Derived from a low fee rate
    LowFeeHeuristic,
    /// Normal fee, assumed to confirm almost immediately
    FastConfirmationAssumed,
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserProvided => write!(f, "user_provided"),
            Self::LowFeeHeuristic => write!(f, "low_fee_heuristic"),
            Self::FastConfirmationAssumed => write!(f, "fast_confirmation_assumed"),
        }
    }
}

/// Fee rate and its classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeeClassification {
    /// sat/vB, 0 when the size is unknown
    pub rate: f64,
    pub is_low_fee: bool,
}

/// Broadcast height with its provenance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BroadcastEstimate {
    pub height: u64,
    pub reason: ReasonCode,
}

/// Delay between broadcast and inclusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Delay {
    /// Negative when broadcast height exceeds inclusion height
    pub blocks: i64,
    pub minutes: i64,
}

/// Inputs to a full delay analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayInput {
    pub inclusion_height: u64,
    pub user_broadcast_height: Option<u64>,
    pub fee_sats: u64,
    pub vsize_bytes: u64,
}

/// Result of analyzing one transaction's delay
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DelayAnalysis {
    pub estimated_broadcast_height: u64,
    pub inclusion_height: u64,
    pub delay_blocks: i64,
    pub delay_minutes: i64,
    pub fee_rate_per_vbyte: f64,
    pub is_low_fee: bool,
    pub is_delayed: bool,
    pub reason_code: ReasonCode,
}

impl DelayAnalysis {
    /// Broadcast reported after inclusion: malformed or adversarial input
    pub fn is_anomalous(&self) -> bool {
        self.delay_blocks < 0
    }
}

/// Fee per virtual byte and whether it falls under the low-fee threshold
pub fn classify_fee_rate(fee_sats: u64, vsize_bytes: u64, config: &DelayConfig) -> FeeClassification {
    let rate = if vsize_bytes > 0 {
        fee_sats as f64 / vsize_bytes as f64
    } else {
        0.0
    };

    FeeClassification {
        rate,
        is_low_fee: rate < config.low_fee_threshold,
    }
}

/// Pick the broadcast height: claimant's value, else a fee-based guess
pub fn estimate_broadcast_height(
    inclusion_height: u64,
    fee_rate: f64,
    user_supplied_height: Option<u64>,
    policy_threshold: Option<u64>,
    config: &DelayConfig,
) -> BroadcastEstimate {
    if let Some(height) = user_supplied_height.filter(|h| *h > 0) {
        return BroadcastEstimate {
            height,
            reason: ReasonCode::UserProvided,
        };
    }

    if fee_rate < config.low_fee_threshold {
        let threshold = policy_threshold.unwrap_or(config.default_delay_threshold);
        let fee_wait = (config.heuristic_numerator / (fee_rate + config.heuristic_offset)).floor();
        // Saturating float-to-int cast: NaN maps to 0, overflow to u64::MAX
        let wait_blocks = threshold.max(fee_wait as u64);

        return BroadcastEstimate {
            height: inclusion_height.saturating_sub(wait_blocks),
            reason: ReasonCode::LowFeeHeuristic,
        };
    }

    BroadcastEstimate {
        height: inclusion_height.saturating_sub(config.fast_confirmation_blocks),
        reason: ReasonCode::FastConfirmationAssumed,
    }
}

/// Blocks and minutes between broadcast and inclusion, never clamped
pub fn compute_delay(inclusion_height: u64, broadcast_height: u64, config: &DelayConfig) -> Delay {
    let blocks = inclusion_height as i128 - broadcast_height as i128;
    let blocks = blocks.clamp(i64::MIN as i128, i64::MAX as i128) as i64;

    Delay {
        blocks,
        minutes: blocks.saturating_mul(config.expected_block_minutes as i64),
    }
}

/// Full analysis for one transaction against a policy threshold
pub fn analyze_delay(input: &DelayInput, policy_threshold: u64, config: &DelayConfig) -> Result<DelayAnalysis> {
    let user_height = input.user_broadcast_height.filter(|h| *h > 0);
    if user_height.is_none() && input.vsize_bytes == 0 {
        return Err(VerifyError::InsufficientData(
            "no broadcast height supplied and transaction size unknown".to_string(),
        ));
    }

    let fee = classify_fee_rate(input.fee_sats, input.vsize_bytes, config);
    let estimate = estimate_broadcast_height(
        input.inclusion_height,
        fee.rate,
        user_height,
        Some(policy_threshold),
        config,
    );
    let delay = compute_delay(input.inclusion_height, estimate.height, config);

    let analysis = DelayAnalysis {
        estimated_broadcast_height: estimate.height,
        inclusion_height: input.inclusion_height,
        delay_blocks: delay.blocks,
        delay_minutes: delay.minutes,
        fee_rate_per_vbyte: fee.rate,
        is_low_fee: fee.is_low_fee,
        is_delayed: (delay.blocks as i128) >= policy_threshold as i128,
        reason_code: estimate.reason,
    };

    if analysis.is_anomalous() {
        log_core_event(
            LogLevel::Warn,
            EventCategory::Delay,
            "broadcast_after_inclusion",
            serde_json::json!({
                "inclusion_height": analysis.inclusion_height,
                "broadcast_height": analysis.estimated_broadcast_height,
                "delay_blocks": analysis.delay_blocks,
            }),
        );
    }

    Ok(analysis)
}
