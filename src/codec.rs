//! Hex and Byte Helpers
//!
//! Hash values are displayed in reversed byte order but hashed and verified
//! in internal order, so most inputs pass through here before anything else
//! looks at them. All hex inputs may carry a `0x` prefix.

use serde::{Deserialize, Deserializer, Serializer};

use crate::common::error::CodecError;
use crate::proof::RawMerkleProof;

/// Maximum number of sibling hashes the inclusion verifier accepts
pub const MAX_PROOF_DEPTH: usize = 14;

/// Hex characters in a 32-byte hash
pub const HASH32_HEX_LEN: usize = 64;

/// Hex characters in an 80-byte block header
pub const HEADER80_HEX_LEN: usize = 160;

/// Strip an optional `0x` / `0X` prefix
pub fn strip_0x(hex: &str) -> &str {
    hex.strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex)
}

/// Decode hex into bytes. An empty string decodes to an empty vector.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, CodecError> {
    Ok(hex::decode(strip_0x(hex))?)
}

/// Encode bytes as lowercase hex without prefix
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode hex and reverse the byte order
pub fn reverse_bytes(hex: &str) -> Result<Vec<u8>, CodecError> {
    let mut bytes = hex_to_bytes(hex)?;
    bytes.reverse();
    Ok(bytes)
}

/// Decode a 32-byte hash and reverse it into internal byte order
pub fn reverse_hash32(hex: &str) -> Result<[u8; 32], CodecError> {
    let bytes = reverse_bytes(hex)?;
    bytes.try_into().map_err(|_| CodecError::InvalidHex)
}

fn is_hex_of_len(hex: &str, len: usize) -> bool {
    let body = strip_0x(hex);
    body.len() == len && body.bytes().all(|b| b.is_ascii_hexdigit())
}

/// True iff `hex` is exactly 32 bytes of hex
pub fn is_valid_hash32(hex: &str) -> bool {
    is_hex_of_len(hex, HASH32_HEX_LEN)
}

/// True iff `hex` is exactly 80 bytes of hex
pub fn is_valid_header80(hex: &str) -> bool {
    is_hex_of_len(hex, HEADER80_HEX_LEN)
}

/// True iff every sibling is a 32-byte hash and the proof fits the verifier
///
/// Height and position are unsigned, so the non-negativity checks hold by type.
pub fn is_valid_merkle_proof_shape(proof: &RawMerkleProof) -> bool {
    proof.sibling_hashes.len() <= MAX_PROOF_DEPTH
        && proof.sibling_hashes.iter().all(|h| is_valid_hash32(h))
}

/// Serialize a byte buffer as a lowercase hex string
pub fn serialize_hex<S, T>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: AsRef<[u8]>,
{
    serializer.serialize_str(&bytes_to_hex(bytes.as_ref()))
}

/// Serialize a list of hashes as lowercase hex strings
pub fn serialize_hex_list<S>(hashes: &[[u8; 32]], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(hashes.iter().map(|h| bytes_to_hex(h)))
}

/// Deserialize a 32-byte hash from hex, keeping byte order as written
pub fn deserialize_hash32<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let bytes = hex_to_bytes(&s).map_err(serde::de::Error::custom)?;
    bytes
        .try_into()
        .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
}
