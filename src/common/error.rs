//! Common Error Types for btcdelay
//!
//! Every failure the verification core can produce, grouped into the
//! categories callers branch on. A rejected claim is not an error: see
//! [`crate::eligibility::EligibilityVerdict`].

use thiserror::Error;

/// Hex decoding failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("odd length")]
    OddLength,

    #[error("invalid hex")]
    InvalidHex,
}

impl From<hex::FromHexError> for CodecError {
    fn from(e: hex::FromHexError) -> Self {
        match e {
            hex::FromHexError::OddLength => CodecError::OddLength,
            _ => CodecError::InvalidHex,
        }
    }
}

/// Broad failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed hex
    Format,
    /// Structurally invalid input (lengths, shapes, depth)
    Validation,
    /// Computed transaction id disagrees with the claimed one
    CrossCheck,
    /// Verifier says the transaction is not in the claimed block
    NotMined,
    /// Not enough data to estimate broadcast height
    InsufficientData,
    /// Failure reported by a data source or verifier
    External,
}

/// Root error type for btcdelay
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerifyError {
    #[error("format error: {0}")]
    Format(#[from] CodecError),

    #[error("empty input")]
    EmptyInput,

    #[error("transaction too short: {len} bytes, need at least {min}")]
    TooShort { len: usize, min: usize },

    #[error("invalid txid: {0}")]
    InvalidTxid(String),

    #[error("invalid block header: {0}")]
    InvalidHeader(String),

    #[error("invalid merkle proof: {0}")]
    InvalidProof(String),

    #[error("merkle proof too deep: {depth} siblings, max {max}")]
    ProofTooDeep { depth: usize, max: usize },

    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("txid mismatch: claimed {claimed}, computed {computed}")]
    TxidMismatch { claimed: String, computed: String },

    #[error("transaction not mined: {0}")]
    NotMined(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("payload decode error: {0}")]
    Payload(String),

    #[error("data source error: {0}")]
    DataSource(String),

    #[error("verifier error: {0}")]
    Verifier(String),
}

impl From<serde_json::Error> for VerifyError {
    fn from(e: serde_json::Error) -> Self {
        VerifyError::Payload(e.to_string())
    }
}

impl VerifyError {
    /// Create a data source error
    pub fn data_source(msg: impl Into<String>) -> Self {
        Self::DataSource(msg.into())
    }

    /// Create a verifier error
    pub fn verifier(msg: impl Into<String>) -> Self {
        Self::Verifier(msg.into())
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            VerifyError::Format(_) | VerifyError::Payload(_) => ErrorKind::Format,
            VerifyError::EmptyInput
            | VerifyError::TooShort { .. }
            | VerifyError::InvalidTxid(_)
            | VerifyError::InvalidHeader(_)
            | VerifyError::InvalidProof(_)
            | VerifyError::ProofTooDeep { .. }
            | VerifyError::MalformedTransaction(_)
            | VerifyError::MissingField(_) => ErrorKind::Validation,
            VerifyError::TxidMismatch { .. } => ErrorKind::CrossCheck,
            VerifyError::NotMined(_) => ErrorKind::NotMined,
            VerifyError::InsufficientData(_) => ErrorKind::InsufficientData,
            VerifyError::DataSource(_) | VerifyError::Verifier(_) => ErrorKind::External,
        }
    }

    /// Check if re-running the pipeline with fresh data could succeed.
    ///
    /// The core never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VerifyError::DataSource(_) | VerifyError::Verifier(_))
    }

    /// Get error code for logs and JSON reports
    pub fn error_code(&self) -> &'static str {
        match self {
            VerifyError::Format(_) => "FORMAT_ERROR",
            VerifyError::EmptyInput => "EMPTY_INPUT",
            VerifyError::TooShort { .. } => "TOO_SHORT",
            VerifyError::InvalidTxid(_) => "INVALID_TXID",
            VerifyError::InvalidHeader(_) => "INVALID_HEADER",
            VerifyError::InvalidProof(_) => "INVALID_PROOF",
            VerifyError::ProofTooDeep { .. } => "PROOF_TOO_DEEP",
            VerifyError::MalformedTransaction(_) => "MALFORMED_TRANSACTION",
            VerifyError::TxidMismatch { .. } => "TXID_MISMATCH",
            VerifyError::NotMined(_) => "NOT_MINED",
            VerifyError::InsufficientData(_) => "INSUFFICIENT_DATA",
            VerifyError::MissingField(_) => "MISSING_FIELD",
            VerifyError::Payload(_) => "PAYLOAD_ERROR",
            VerifyError::DataSource(_) => "DATA_SOURCE_ERROR",
            VerifyError::Verifier(_) => "VERIFIER_ERROR",
        }
    }
}

/// Result type alias using VerifyError
pub type Result<T> = std::result::Result<T, VerifyError>;
