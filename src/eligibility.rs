//! Claim Eligibility
//!
//! Confirmations are checked before delay, so a rejected claimant always
//! sees the most actionable reason first. A delay equal to the threshold is
//! eligible.

use serde::Serialize;

use crate::common::config::PolicyConfig;

/// Why a claim was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    InsufficientConfirmations { confirmations: u64, required: u64 },
    DelayBelowThreshold { delay_blocks: i64, threshold: u64 },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientConfirmations {
                confirmations,
                required,
            } => write!(
                f,
                "insufficient confirmations ({}/{} required)",
                confirmations, required
            ),
            Self::DelayBelowThreshold {
                delay_blocks,
                threshold,
            } => write!(
                f,
                "delay below threshold ({} blocks, {} required)",
                delay_blocks, threshold
            ),
        }
    }
}

/// Accept/reject outcome for one claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityVerdict {
    pub is_eligible: bool,
    pub rejection_reason: Option<String>,
    pub rejection: Option<Rejection>,
    pub required_threshold: u64,
}

impl EligibilityVerdict {
    fn accepted(threshold: u64) -> Self {
        Self {
            is_eligible: true,
            rejection_reason: None,
            rejection: None,
            required_threshold: threshold,
        }
    }

    fn rejected(rejection: Rejection, threshold: u64) -> Self {
        Self {
            is_eligible: false,
            rejection_reason: Some(rejection.to_string()),
            rejection: Some(rejection),
            required_threshold: threshold,
        }
    }
}

/// Decide a claim from confirmations and delay
pub fn decide(
    confirmations: u64,
    min_confirmations: u64,
    delay_blocks: i64,
    threshold: u64,
) -> EligibilityVerdict {
    if confirmations < min_confirmations {
        return EligibilityVerdict::rejected(
            Rejection::InsufficientConfirmations {
                confirmations,
                required: min_confirmations,
            },
            threshold,
        );
    }

    if (delay_blocks as i128) < threshold as i128 {
        return EligibilityVerdict::rejected(
            Rejection::DelayBelowThreshold {
                delay_blocks,
                threshold,
            },
            threshold,
        );
    }

    EligibilityVerdict::accepted(threshold)
}

/// [`decide`] with thresholds taken from a policy
pub fn decide_for_policy(confirmations: u64, delay_blocks: i64, policy: &PolicyConfig) -> EligibilityVerdict {
    decide(
        confirmations,
        policy.min_confirmations,
        delay_blocks,
        policy.delay_threshold,
    )
}

/// Confirmations of a block at `inclusion_height` given the chain tip
pub fn confirmations(tip_height: u64, inclusion_height: u64) -> u64 {
    if tip_height < inclusion_height {
        return 0;
    }
    tip_height - inclusion_height + 1
}
