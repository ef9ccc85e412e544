//! Environment-based Configuration for btcdelay
//!
//! Policy parameters and analyzer tuning are loaded once at the edge and
//! passed into the core explicitly. Nothing inside the core reads the
//! environment.
//!
//! # Environment Variables
//!
//! ## Policy
//! - `BTCDELAY_DELAY_THRESHOLD` - Minimum delay in blocks for a payout (default: 35)
//! - `BTCDELAY_MIN_CONFIRMATIONS` - Required confirmations (default: 6)
//!
//! ## Delay Analysis
//! - `BTCDELAY_LOW_FEE_THRESHOLD` - Fee rate (sat/vB) below which a tx counts as low-fee (default: 5)
//! - `BTCDELAY_EXPECTED_BLOCK_MINUTES` - Expected minutes per block (default: 10)
//! - `BTCDELAY_FAST_CONFIRMATION_BLOCKS` - Assumed wait for normal-fee transactions (default: 2)
//!
//! ## Logging
//! - `BTCDELAY_LOG_LEVEL` - Logging level (trace, debug, info, warn, error)
//! - `BTCDELAY_LOG_JSON` - Set to "1" or "true" for JSON log output

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Default delay threshold in blocks
pub const DEFAULT_DELAY_THRESHOLD: u64 = 35;

/// Default confirmations required before a claim is considered
pub const DEFAULT_MIN_CONFIRMATIONS: u64 = 6;

/// Default low-fee cut-off in sat/vB
pub const DEFAULT_LOW_FEE_THRESHOLD: f64 = 5.0;

/// Default expected block interval in minutes
pub const DEFAULT_EXPECTED_BLOCK_MINUTES: u64 = 10;

/// Default wait assumed for transactions paying a normal fee
pub const DEFAULT_FAST_CONFIRMATION_BLOCKS: u64 = 2;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Per-policy claim parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Minimum blocks between broadcast and inclusion
    pub delay_threshold: u64,
    /// Minimum confirmations on the inclusion block
    pub min_confirmations: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            delay_threshold: DEFAULT_DELAY_THRESHOLD,
            min_confirmations: DEFAULT_MIN_CONFIRMATIONS,
        }
    }
}

impl PolicyConfig {
    pub fn new(delay_threshold: u64, min_confirmations: u64) -> Self {
        Self {
            delay_threshold,
            min_confirmations,
        }
    }
}

/// Delay analyzer parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Fee rate (sat/vB) below which a transaction is low-fee
    pub low_fee_threshold: f64,
    /// Threshold used by the low-fee heuristic when the policy gives none
    pub default_delay_threshold: u64,
    /// Minutes per block used to convert delays
    pub expected_block_minutes: u64,
    /// Wait assumed for transactions that are not low-fee
    pub fast_confirmation_blocks: u64,
    /// Numerator of the fee-based wait estimate
    pub heuristic_numerator: f64,
    /// Added to the fee rate before dividing
    pub heuristic_offset: f64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            low_fee_threshold: DEFAULT_LOW_FEE_THRESHOLD,
            default_delay_threshold: DEFAULT_DELAY_THRESHOLD,
            expected_block_minutes: DEFAULT_EXPECTED_BLOCK_MINUTES,
            fast_confirmation_blocks: DEFAULT_FAST_CONFIRMATION_BLOCKS,
            heuristic_numerator: 50.0,
            heuristic_offset: 0.1,
        }
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub policy: PolicyConfig,
    pub delay: DelayConfig,
    /// Log level
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
            delay: DelayConfig::default(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let policy = PolicyConfig {
            delay_threshold: parse_env("BTCDELAY_DELAY_THRESHOLD", DEFAULT_DELAY_THRESHOLD)?,
            min_confirmations: parse_env("BTCDELAY_MIN_CONFIRMATIONS", DEFAULT_MIN_CONFIRMATIONS)?,
        };

        let delay = DelayConfig {
            low_fee_threshold: parse_env("BTCDELAY_LOW_FEE_THRESHOLD", DEFAULT_LOW_FEE_THRESHOLD)?,
            default_delay_threshold: policy.delay_threshold,
            expected_block_minutes: parse_env(
                "BTCDELAY_EXPECTED_BLOCK_MINUTES",
                DEFAULT_EXPECTED_BLOCK_MINUTES,
            )?,
            fast_confirmation_blocks: parse_env(
                "BTCDELAY_FAST_CONFIRMATION_BLOCKS",
                DEFAULT_FAST_CONFIRMATION_BLOCKS,
            )?,
            ..DelayConfig::default()
        };

        let log_level = env::var("BTCDELAY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_json = env::var("BTCDELAY_LOG_JSON")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let config = Self {
            policy,
            delay,
            log_level,
            log_json,
        };
        config.validate()?;

        Ok(config)
    }

    /// Reject values the analyzer cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.policy.min_confirmations == 0 {
            return Err(ConfigError::InvalidValue(
                "BTCDELAY_MIN_CONFIRMATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let fee = self.delay.low_fee_threshold;
        if !fee.is_finite() || fee <= 0.0 {
            return Err(ConfigError::InvalidValue(
                "BTCDELAY_LOW_FEE_THRESHOLD".to_string(),
                format!("must be a positive number, got {}", fee),
            ));
        }

        if self.delay.expected_block_minutes == 0 {
            return Err(ConfigError::InvalidValue(
                "BTCDELAY_EXPECTED_BLOCK_MINUTES".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse an optional env var, falling back to `default` only when unset
fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), raw)),
        Err(_) => Ok(default),
    }
}
