//! Common Infrastructure Module
//!
//! This module contains:
//! - Configuration loading from environment variables
//! - Structured logging setup
//! - Common error types

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::{AppConfig, ConfigError, DelayConfig, PolicyConfig};
pub use error::{CodecError, ErrorKind, Result, VerifyError};
pub use logging::{
    generate_correlation_id, init_from_config, init_logging, log_claim_event, log_core_event,
    log_security_event,
    EventCategory, LogEvent, LogLevel, LoggingError,
};
