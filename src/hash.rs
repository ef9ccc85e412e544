//! Double-SHA256 Digests and Transaction IDs

use sha2::{Digest, Sha256};

use crate::codec::{bytes_to_hex, hex_to_bytes};
use crate::common::error::{Result, VerifyError};

/// Smallest serialization that can still be a transaction:
/// version(4) + input count(1) + output count(1) + lock time(4)
pub const MIN_TX_BYTES: usize = 10;

/// Input accepted by [`double_hash`]
#[derive(Debug, Clone, Copy)]
pub enum HashInput<'a> {
    Bytes(&'a [u8]),
    Hex(&'a str),
}

impl<'a> From<&'a [u8]> for HashInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        HashInput::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for HashInput<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        HashInput::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for HashInput<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        HashInput::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for HashInput<'a> {
    fn from(hex: &'a str) -> Self {
        HashInput::Hex(hex)
    }
}

impl<'a> From<&'a String> for HashInput<'a> {
    fn from(hex: &'a String) -> Self {
        HashInput::Hex(hex)
    }
}

/// SHA256(SHA256(data)) over raw bytes
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// Double SHA256 of bytes or hex, in internal byte order
pub fn double_hash<'a>(data: impl Into<HashInput<'a>>) -> Result<[u8; 32]> {
    match data.into() {
        HashInput::Bytes(bytes) => {
            if bytes.is_empty() {
                return Err(VerifyError::EmptyInput);
            }
            Ok(sha256d(bytes))
        }
        HashInput::Hex(hex) => {
            let bytes = hex_to_bytes(hex)?;
            if bytes.is_empty() {
                return Err(VerifyError::EmptyInput);
            }
            Ok(sha256d(&bytes))
        }
    }
}

/// Transaction id (display byte order) of a non-witness serialization
pub fn compute_txid(non_witness_tx_hex: &str) -> Result<String> {
    let bytes = hex_to_bytes(non_witness_tx_hex)?;
    if bytes.is_empty() {
        return Err(VerifyError::EmptyInput);
    }
    if bytes.len() < MIN_TX_BYTES {
        return Err(VerifyError::TooShort {
            len: bytes.len(),
            min: MIN_TX_BYTES,
        });
    }

    let mut digest = sha256d(&bytes);
    digest.reverse();
    Ok(bytes_to_hex(&digest))
}
