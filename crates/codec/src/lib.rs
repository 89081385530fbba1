//! # Codec — bounds-checked binary read primitives
//!
//! The lowest layer of the firesift decoder stack. Everything read out of a
//! cache file goes through this crate: varints, fixed-width integers,
//! IEEE-754 doubles, and length-delimited byte runs.
//!
//! ## Varint encoding
//!
//! ```text
//! [0gggggggg]                      1 byte,  values 0..128
//! [1ggggggg][0ggggggg]             2 bytes, values 128..16384
//! ...up to 10 bytes for a full u64
//! ```
//!
//! Each byte carries 7 payload bits in little-endian group order; bit 0x80
//! signals a continuation. A varint with no terminator within 10 bytes (or
//! that runs off the end of the buffer) fails with
//! [`CodecError::TruncatedVarint`].
//!
//! ## Error policy
//!
//! Every read is bounds-checked and returns a typed error instead of
//! panicking. The cache on disk makes no consistency promises — a torn write
//! can truncate any structure mid-byte — so callers skip the enclosing
//! record or block and keep going.

use thiserror::Error;

/// Maximum number of bytes a single varint may occupy (10 × 7 bits > 64).
pub const MAX_VARINT_BYTES: usize = 10;

/// Errors produced by the low-level read primitives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A varint ran off the end of the buffer or exceeded 10 bytes without
    /// a terminating byte.
    #[error("truncated varint at offset {offset}")]
    TruncatedVarint { offset: usize },

    /// A fixed-width or length-delimited read needed more bytes than remain.
    #[error("out of bounds: needed {needed} bytes at offset {offset}, {remaining} remain")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Decodes a varint from `buf` starting at `pos`.
///
/// Returns the decoded value and the position of the first byte after the
/// varint.
///
/// # Errors
///
/// [`CodecError::TruncatedVarint`] if the buffer ends before a terminating
/// byte, or no terminator appears within [`MAX_VARINT_BYTES`].
pub fn read_varint_at(buf: &[u8], pos: usize) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    let mut i = pos;
    while i < buf.len() && i - pos < MAX_VARINT_BYTES {
        let byte = buf[i];
        result |= u64::from(byte & 0x7f) << shift;
        i += 1;
        if byte & 0x80 == 0 {
            return Ok((result, i));
        }
        shift += 7;
    }
    Err(CodecError::TruncatedVarint { offset: pos })
}

/// A transient, bounds-checked position into an immutable byte buffer.
///
/// Never persisted; lives only while one record or block is being decoded.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte offset into the underlying buffer.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::OutOfBounds {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Advances past `n` bytes without interpreting them.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Reads exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    /// Reads a single byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads a base-128 varint, advancing past it.
    pub fn read_varint(&mut self) -> Result<u64> {
        let (value, next) = read_varint_at(self.buf, self.pos)?;
        self.pos = next;
        Ok(value)
    }

    /// Reads a little-endian u32.
    pub fn read_fixed32_le(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a little-endian u64.
    pub fn read_fixed64_le(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Reads a little-endian IEEE-754 double.
    pub fn read_double_le(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_fixed64_le()?))
    }

    /// Reads a varint length followed by that many bytes.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfBounds`] if the declared length exceeds the
    /// remaining buffer — the usual signature of a torn write.
    pub fn read_length_delimited(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varint()? as usize;
        self.take(len)
    }
}
