//! # Canonical Wire Encoding
//!
//! Length-prefixed binary codec for the proof records, after the
//! Bitcoin serialization conventions the original protocol spoke:
//!
//! - counts and lengths are CompactSize varints (minimal form only),
//! - byte strings are varint length ‖ bytes,
//! - arbitrary-precision integers are their unsigned minimal big-endian
//!   representation, length-prefixed,
//! - an absent proof is a single zero count; decoding a zero count
//!   yields `None`, never an empty-but-present proof.
//!
//! Decoders bound every count by a caller-configured maximum so a
//! malicious peer cannot force large allocations.

use crate::proofs::{PermutationTestProof, PoupardSternProof};
use num_bigint_dig::BigUint;
use thiserror::Error;

/// Default bound on decoded element counts.
pub const DEFAULT_MAX_ARRAY_SIZE: u64 = 1024 * 1024;

/// Wire decode errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// Input ended before the announced length
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Varint not in minimal CompactSize form
    #[error("non-canonical varint encoding")]
    NonCanonicalVarInt,

    /// Announced count exceeds the configured bound
    #[error("array of {len} elements exceeds maximum {max}")]
    OversizedArray {
        /// Announced element count
        len: u64,
        /// Configured maximum
        max: u64,
    },

    /// Input longer than the encoded value
    #[error("trailing bytes after value")]
    TrailingBytes,
}

/// Append-only encoder.
#[derive(Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    /// Fresh empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the writer, yielding the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// CompactSize varint.
    pub fn put_varint(&mut self, value: u64) {
        match value {
            0..=0xFC => self.buf.push(value as u8),
            0xFD..=0xFFFF => {
                self.buf.push(0xFD);
                self.buf.extend_from_slice(&(value as u16).to_le_bytes());
            }
            0x1_0000..=0xFFFF_FFFF => {
                self.buf.push(0xFE);
                self.buf.extend_from_slice(&(value as u32).to_le_bytes());
            }
            _ => {
                self.buf.push(0xFF);
                self.buf.extend_from_slice(&value.to_le_bytes());
            }
        }
    }

    /// Length-prefixed byte string.
    pub fn put_var_bytes(&mut self, bytes: &[u8]) {
        self.put_varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    /// Length-prefixed unsigned minimal big-endian integer.
    pub fn put_biguint(&mut self, value: &BigUint) {
        self.put_var_bytes(&value.to_bytes_be());
    }
}

/// Bounds-checked decoder over a byte slice.
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
    max_array_size: u64,
}

impl<'a> WireReader<'a> {
    /// Reader with the default count bound.
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_max_array_size(buf, DEFAULT_MAX_ARRAY_SIZE)
    }

    /// Reader with an explicit count bound.
    pub fn with_max_array_size(buf: &'a [u8], max_array_size: u64) -> Self {
        Self {
            buf,
            pos: 0,
            max_array_size,
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or(WireError::UnexpectedEof)?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        self.take(N)?
            .try_into()
            .map_err(|_| WireError::UnexpectedEof)
    }

    /// CompactSize varint, minimal form only.
    pub fn read_varint(&mut self) -> Result<u64, WireError> {
        let tag = self.take(1)?[0];
        let value = match tag {
            0..=0xFC => u64::from(tag),
            0xFD => {
                let v = u64::from(u16::from_le_bytes(self.take_array()?));
                if v < 0xFD {
                    return Err(WireError::NonCanonicalVarInt);
                }
                v
            }
            0xFE => {
                let v = u64::from(u32::from_le_bytes(self.take_array()?));
                if v <= 0xFFFF {
                    return Err(WireError::NonCanonicalVarInt);
                }
                v
            }
            0xFF => {
                let v = u64::from_le_bytes(self.take_array()?);
                if v <= 0xFFFF_FFFF {
                    return Err(WireError::NonCanonicalVarInt);
                }
                v
            }
        };
        Ok(value)
    }

    /// A count, checked against the configured bound.
    pub fn read_count(&mut self) -> Result<u64, WireError> {
        let len = self.read_varint()?;
        if len > self.max_array_size {
            return Err(WireError::OversizedArray {
                len,
                max: self.max_array_size,
            });
        }
        Ok(len)
    }

    /// Length-prefixed byte string.
    pub fn read_var_bytes(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.read_count()?;
        Ok(self.take(len as usize)?.to_vec())
    }

    /// Length-prefixed unsigned big-endian integer.
    pub fn read_biguint(&mut self) -> Result<BigUint, WireError> {
        Ok(BigUint::from_bytes_be(&self.read_var_bytes()?))
    }

    /// Assert the whole input was consumed.
    pub fn finish(self) -> Result<(), WireError> {
        if self.pos != self.buf.len() {
            return Err(WireError::TrailingBytes);
        }
        Ok(())
    }
}

impl PermutationTestProof {
    /// Encode, with `None` as the zero-count absence sentinel.
    pub fn encode_opt(proof: Option<&Self>) -> Vec<u8> {
        let mut w = WireWriter::new();
        match proof {
            None => w.put_varint(0),
            Some(proof) => {
                w.put_varint(proof.signatures().len() as u64);
                for signature in proof.signatures() {
                    w.put_var_bytes(signature);
                }
            }
        }
        w.into_bytes()
    }

    /// Decode counterpart of [`encode_opt`](Self::encode_opt).
    pub fn decode_opt(reader: &mut WireReader<'_>) -> Result<Option<Self>, WireError> {
        let count = reader.read_count()?;
        if count == 0 {
            return Ok(None);
        }
        let mut signatures = Vec::with_capacity(count as usize);
        for _ in 0..count {
            signatures.push(reader.read_var_bytes()?);
        }
        Ok(Some(Self::from_wire(signatures)))
    }
}

impl PoupardSternProof {
    /// Encode, with `None` as the zero-count absence sentinel.
    pub fn encode_opt(proof: Option<&Self>) -> Vec<u8> {
        let mut w = WireWriter::new();
        match proof {
            None => w.put_varint(0),
            Some(proof) => {
                w.put_varint(proof.x_values().len() as u64);
                for x in proof.x_values() {
                    w.put_biguint(x);
                }
                w.put_biguint(proof.y_value());
            }
        }
        w.into_bytes()
    }

    /// Decode counterpart of [`encode_opt`](Self::encode_opt).
    pub fn decode_opt(reader: &mut WireReader<'_>) -> Result<Option<Self>, WireError> {
        let count = reader.read_count()?;
        if count == 0 {
            return Ok(None);
        }
        let mut x_values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            x_values.push(reader.read_biguint()?);
        }
        let y_value = reader.read_biguint()?;
        Ok(Some(Self::from_wire(x_values, y_value)))
    }
}
