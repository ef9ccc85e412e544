//! SegWit Witness Stripping
//!
//! Rebuilds the legacy serialization of a witness-bearing transaction so its
//! double hash equals the transaction id:
//!
//! ```text
//! version | marker 0x00 | flag 0x01 | inputs | outputs | witnesses | lock_time
//!                 ^^^^^^^^^^^^^^^^^^^^                     ^^^^^^^^^
//!                 dropped                                  dropped
//! ```
//!
//! Parsing walks a [`TxCursor`] field by field; any read past the end is a
//! `MalformedTransaction` error rather than a silently wrong txid.

use crate::codec::{bytes_to_hex, hex_to_bytes, strip_0x};
use crate::common::error::{Result, VerifyError};

/// SegWit marker and flag bytes following the version field
pub const SEGWIT_MARKER: [u8; 2] = [0x00, 0x01];

/// Hex characters in the 4-byte version field
const VERSION_HEX_LEN: usize = 8;

/// Outpoint: previous txid (32) + output index (4)
const OUTPOINT_LEN: usize = 36;

/// Output value in satoshis
const VALUE_LEN: usize = 8;

/// Sanity bound on declared input/output/witness-item counts
const MAX_DECLARED_COUNT: u64 = 1_000_000;

/// Forward-only reader over a serialized transaction
#[derive(Debug)]
pub struct TxCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> TxCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Read exactly `n` bytes
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(VerifyError::MalformedTransaction(format!(
                "need {} bytes at offset {}, only {} left",
                n,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a CompactSize integer, rejecting non-minimal encodings
    pub fn read_varint(&mut self) -> Result<u64> {
        let start = self.pos;
        let value = match self.read_u8()? {
            b @ 0x00..=0xfc => return Ok(b as u64),
            0xfd => {
                let b = self.read_bytes(2)?;
                (u16::from_le_bytes([b[0], b[1]]) as u64, 0xfd)
            }
            0xfe => {
                let b = self.read_bytes(4)?;
                (u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as u64, 0x1_0000)
            }
            0xff => {
                let b = self.read_bytes(8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(b);
                (u64::from_le_bytes(buf), 0x1_0000_0000)
            }
        };

        let (value, min) = value;
        if value < min {
            return Err(VerifyError::MalformedTransaction(format!(
                "non-canonical varint at offset {}",
                start
            )));
        }
        Ok(value)
    }

    /// Read a varint length followed by that many bytes
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varint()?;
        let len = usize::try_from(len)
            .map_err(|_| VerifyError::MalformedTransaction(format!("length {} overflows", len)))?;
        self.read_bytes(len)
    }

    /// Everything consumed between `from` and the current offset
    pub fn consumed_since(&self, from: usize) -> &'a [u8] {
        &self.data[from..self.pos]
    }
}

/// True if the bytes after the 4-byte version are the SegWit marker and flag
pub fn has_witness_marker(tx: &[u8]) -> bool {
    tx.len() >= 6 && tx[4..6] == SEGWIT_MARKER
}

fn read_count(cursor: &mut TxCursor<'_>, what: &str) -> Result<u64> {
    let count = cursor.read_varint()?;
    if count > MAX_DECLARED_COUNT {
        return Err(VerifyError::MalformedTransaction(format!(
            "{} count {} exceeds {}",
            what, count, MAX_DECLARED_COUNT
        )));
    }
    Ok(count)
}

/// Remove the marker, flag and witness stacks from a SegWit transaction.
///
/// Input without the marker, or too short to hold a version field, is
/// returned exactly as given. Stripped output is lowercase hex without a
/// `0x` prefix.
pub fn strip_witness_data(tx_hex: &str) -> Result<String> {
    if strip_0x(tx_hex).len() < VERSION_HEX_LEN {
        return Ok(tx_hex.to_string());
    }

    let tx = hex_to_bytes(tx_hex)?;
    if !has_witness_marker(&tx) {
        return Ok(tx_hex.to_string());
    }

    let stripped = strip_witness_bytes(&tx)?;
    Ok(bytes_to_hex(&stripped))
}

/// Byte-level form of [`strip_witness_data`] for marked transactions
pub fn strip_witness_bytes(tx: &[u8]) -> Result<Vec<u8>> {
    let mut cursor = TxCursor::new(tx);
    let mut out = Vec::with_capacity(tx.len());

    out.extend_from_slice(cursor.read_bytes(4)?);
    cursor.read_bytes(SEGWIT_MARKER.len())?;

    // Inputs and outputs are copied verbatim, including their counts
    let body_start = cursor.position();

    let input_count = read_count(&mut cursor, "input")?;
    for _ in 0..input_count {
        cursor.read_bytes(OUTPOINT_LEN)?;
        cursor.read_var_bytes()?;
        cursor.read_u32_le()?;
    }

    let output_count = read_count(&mut cursor, "output")?;
    for _ in 0..output_count {
        cursor.read_bytes(VALUE_LEN)?;
        cursor.read_var_bytes()?;
    }

    out.extend_from_slice(cursor.consumed_since(body_start));

    // One witness stack per input
    for _ in 0..input_count {
        let items = read_count(&mut cursor, "witness item")?;
        for _ in 0..items {
            cursor.read_var_bytes()?;
        }
    }

    out.extend_from_slice(cursor.read_bytes(4)?);

    if cursor.remaining() != 0 {
        return Err(VerifyError::MalformedTransaction(format!(
            "{} trailing bytes after lock time",
            cursor.remaining()
        )));
    }

    tracing::trace!(
        target: "btcdelay::witness",
        inputs = input_count,
        outputs = output_count,
        witness_bytes = tx.len() - out.len(),
        "stripped witness data"
    );

    Ok(out)
}
