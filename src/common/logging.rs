//! Structured Logging for btcdelay
//!
//! JSON or pretty output via `tracing-subscriber`, plus helpers that render
//! claim and security events as structured JSON lines.
//!
//! # Usage
//!
//! ```rust,ignore
//! use btcdelay::common::logging::{init_logging, LogLevel};
//!
//! init_logging(LogLevel::Info, true)?;
//! tracing::info!(target: "btcdelay::claim", txid = %txid, "evaluating claim");
//! ```

use serde::Serialize;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use super::config::AppConfig;

// ============================================================================
// Log Levels
// ============================================================================

/// Application log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

// ============================================================================
// Structured Event Types
// ============================================================================

/// Event categories for structured logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Proof package construction
    Proof,
    /// Delay analysis
    Delay,
    /// Eligibility decisions and claim outcomes
    Eligibility,
    /// Possible substitution attempts (txid or digest mismatch)
    Security,
}

/// Structured log event
#[derive(Debug, Serialize)]
pub struct LogEvent {
    /// Event timestamp (RFC 3339)
    pub timestamp: String,
    pub level: String,
    pub category: EventCategory,
    pub message: String,
    /// Correlation ID of the claim evaluation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

/// Error details for error events
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl LogEvent {
    /// Create a new log event
    pub fn new(level: LogLevel, category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: level.as_filter().to_uppercase(),
            category,
            message: message.into(),
            correlation_id: None,
            data: None,
            error: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error = Some(ErrorDetails {
            code: code.into(),
            message: message.into(),
        });
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"error\": \"failed to serialize log\", \"message\": \"{}\"}}",
                self.message
            )
        })
    }
}

// ============================================================================
// Event Helpers
// ============================================================================

/// Log a security-related event
pub fn log_security_event(event_type: &str, details: serde_json::Value, correlation_id: Option<&str>) {
    let mut event = LogEvent::new(LogLevel::Warn, EventCategory::Security, event_type)
        .with_data(details);

    if let Some(id) = correlation_id {
        event = event.with_correlation_id(id);
    }

    tracing::warn!(target: "btcdelay::security", "{}", event.to_json());
}

/// Log a proof or delay event from the verification core
pub fn log_core_event(level: LogLevel, category: EventCategory, event_type: &str, data: serde_json::Value) {
    let line = LogEvent::new(level, category, event_type)
        .with_data(data)
        .to_json();

    match level {
        LogLevel::Trace => tracing::trace!(target: "btcdelay::core", "{}", line),
        LogLevel::Debug => tracing::debug!(target: "btcdelay::core", "{}", line),
        LogLevel::Info => tracing::info!(target: "btcdelay::core", "{}", line),
        LogLevel::Warn => tracing::warn!(target: "btcdelay::core", "{}", line),
        LogLevel::Error => tracing::error!(target: "btcdelay::core", "{}", line),
    }
}

/// Log a claim pipeline event
pub fn log_claim_event(
    event_type: &str,
    correlation_id: &str,
    txid: &str,
    stage: &str,
    error: Option<(&str, &str)>,
) {
    let level = if error.is_some() {
        LogLevel::Error
    } else {
        LogLevel::Info
    };

    let mut event = LogEvent::new(level, EventCategory::Eligibility, event_type)
        .with_correlation_id(correlation_id)
        .with_data(serde_json::json!({
            "txid": txid,
            "stage": stage,
        }));

    if let Some((code, message)) = error {
        event = event.with_error(code, message);
        tracing::error!(target: "btcdelay::claim", "{}", event.to_json());
    } else {
        tracing::info!(target: "btcdelay::claim", "{}", event.to_json());
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the logging system
///
/// `RUST_LOG` overrides `level` when set.
pub fn init_logging(level: LogLevel, json_format: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("btcdelay={}", level.as_filter())));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    }

    Ok(())
}

/// Initialize logging from AppConfig
pub fn init_from_config(config: &AppConfig) -> Result<(), LoggingError> {
    init_logging(LogLevel::from(config.log_level.as_str()), config.log_json)
}

/// Logging errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize logging: {0}")]
    InitFailed(String),
}

/// Generate a unique correlation ID for one claim evaluation
pub fn generate_correlation_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_serialization() {
        let event = LogEvent::new(LogLevel::Warn, EventCategory::Security, "txid_mismatch")
            .with_correlation_id("claim-123")
            .with_data(serde_json::json!({"claimed": "aa"}))
            .with_error("TXID_MISMATCH", "claimed aa");

        let json = event.to_json();
        assert!(json.contains("txid_mismatch"));
        assert!(json.contains("claim-123"));
        assert!(json.contains("\"category\":\"security\""));
        assert!(json.contains("TXID_MISMATCH"));
        assert!(json.contains("\"level\":\"WARN\""));
    }

    #[test]
    fn test_core_event_categories() {
        let proof = LogEvent::new(LogLevel::Debug, EventCategory::Proof, "proof_package_built");
        assert!(proof.to_json().contains("\"category\":\"proof\""));

        let delay = LogEvent::new(LogLevel::Warn, EventCategory::Delay, "broadcast_after_inclusion")
            .with_data(serde_json::json!({"inclusion_height": 100, "broadcast_height": 150}));
        let json = delay.to_json();
        assert!(json.contains("\"category\":\"delay\""));
        assert!(json.contains("\"broadcast_height\":150"));

        log_core_event(LogLevel::Debug, EventCategory::Proof, "proof_package_built", serde_json::json!({}));
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::from("INFO"), LogLevel::Info);
        assert_eq!(LogLevel::from("warning"), LogLevel::Warn);
        assert_eq!(LogLevel::from("unknown"), LogLevel::Info);
    }

    #[test]
    fn test_correlation_ids_are_unique() {
        let id1 = generate_correlation_id();
        let id2 = generate_correlation_id();
        assert_eq!(id1.len(), 32);
        assert_ne!(id1, id2);
    }
}
