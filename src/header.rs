//! Bitcoin Block Header (80 bytes)

use serde::Serialize;

use crate::codec::{bytes_to_hex, hex_to_bytes};
use crate::common::error::{Result, VerifyError};
use crate::hash::sha256d;

/// Serialized header length
pub const HEADER_LEN: usize = 80;

/// Parsed view of a raw block header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockHeader {
    pub version: i32,
    #[serde(serialize_with = "crate::codec::serialize_hex")]
    pub prev_block_hash: [u8; 32],
    #[serde(serialize_with = "crate::codec::serialize_hex")]
    pub merkle_root: [u8; 32],
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    /// Serialize to raw 80-byte format (little-endian)
    pub fn to_raw(&self) -> [u8; HEADER_LEN] {
        let mut raw = [0u8; HEADER_LEN];

        raw[0..4].copy_from_slice(&self.version.to_le_bytes());
        raw[4..36].copy_from_slice(&self.prev_block_hash);
        raw[36..68].copy_from_slice(&self.merkle_root);
        raw[68..72].copy_from_slice(&self.timestamp.to_le_bytes());
        raw[72..76].copy_from_slice(&self.bits.to_le_bytes());
        raw[76..80].copy_from_slice(&self.nonce.to_le_bytes());

        raw
    }

    /// Parse from raw 80-byte format
    pub fn from_raw(raw: &[u8; HEADER_LEN]) -> Self {
        let mut prev_block_hash = [0u8; 32];
        prev_block_hash.copy_from_slice(&raw[4..36]);
        let mut merkle_root = [0u8; 32];
        merkle_root.copy_from_slice(&raw[36..68]);

        Self {
            version: i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            prev_block_hash,
            merkle_root,
            timestamp: u32::from_le_bytes([raw[68], raw[69], raw[70], raw[71]]),
            bits: u32::from_le_bytes([raw[72], raw[73], raw[74], raw[75]]),
            nonce: u32::from_le_bytes([raw[76], raw[77], raw[78], raw[79]]),
        }
    }

    /// Block hash in internal byte order
    pub fn block_hash(&self) -> [u8; 32] {
        sha256d(&self.to_raw())
    }

    /// Block hash as conventionally displayed
    pub fn block_hash_hex(&self) -> String {
        let mut hash = self.block_hash();
        hash.reverse();
        bytes_to_hex(&hash)
    }
}

/// Decode exactly 80 bytes of header hex
pub fn decode_header_hex(header_hex: &str) -> Result<[u8; HEADER_LEN]> {
    let bytes = hex_to_bytes(header_hex)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        VerifyError::InvalidHeader(format!("expected {} bytes, got {}", HEADER_LEN, len))
    })
}

/// Parse header hex into a [`BlockHeader`]
pub fn parse_header_hex(header_hex: &str) -> Result<BlockHeader> {
    Ok(BlockHeader::from_raw(&decode_header_hex(header_hex)?))
}
