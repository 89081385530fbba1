//! Block encoding and decoding with shared-prefix key compression.
//!
//! ## Block layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ ENTRIES                                                  │
//! │                                                          │
//! │ shared (varint) | unshared (varint) | value_len (varint) │
//! │ key delta bytes | value bytes                            │
//! │                                                          │
//! │ ... repeated for each entry ...                          │
//! ├──────────────────────────────────────────────────────────┤
//! │ RESTART ARRAY                                            │
//! │                                                          │
//! │ restart_offset (u32 LE) × num_restarts                   │
//! │ num_restarts (u32 LE)                                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each entry stores only the suffix of its key that differs from the
//! previous entry (`shared` bytes are prepended from the previous key). At
//! every restart point `shared` is zero, so prefix reconstruction resets.
//!
//! Decoding replays entries in order, which is all the table scan needs; the
//! restart array is validated but not used for seeking.

use anyhow::{bail, Result};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use codec::Cursor;

use crate::format::put_varint;

/// How many entries share one restart point when building blocks.
pub const RESTART_INTERVAL: usize = 16;

/// Decodes every `(key, value)` entry of one block, in order.
///
/// # Errors
///
/// Fails on a malformed restart array, a `shared` length that exceeds the
/// previous key, or any entry running past the entry region. The caller
/// skips the whole block; corruption never propagates beyond it.
pub fn decode_block_entries(block: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
    if block.len() < 4 {
        bail!("block too small for restart count: {} bytes", block.len());
    }
    let num_restarts = LittleEndian::read_u32(&block[block.len() - 4..]) as usize;
    let restart_bytes = num_restarts
        .checked_mul(4)
        .and_then(|n| n.checked_add(4))
        .filter(|n| *n <= block.len());
    let Some(restart_bytes) = restart_bytes else {
        bail!("restart array ({num_restarts} entries) exceeds block size");
    };
    let entries_end = block.len() - restart_bytes;

    let mut entries = Vec::new();
    let mut prev_key: Vec<u8> = Vec::new();
    let mut cur = Cursor::new(&block[..entries_end]);

    while !cur.is_empty() {
        let shared = cur.read_varint()? as usize;
        let unshared = cur.read_varint()? as usize;
        let value_len = cur.read_varint()? as usize;

        if shared > prev_key.len() {
            bail!(
                "shared prefix {} exceeds previous key length {}",
                shared,
                prev_key.len()
            );
        }
        let mut key = Vec::with_capacity(shared + unshared);
        key.extend_from_slice(&prev_key[..shared]);
        key.extend_from_slice(cur.read_bytes(unshared)?);
        let value = cur.read_bytes(value_len)?.to_vec();

        prev_key = key.clone();
        entries.push((key, value));
    }

    Ok(entries)
}

/// Builds one block from entries added in ascending key order.
pub struct BlockBuilder {
    buf: Vec<u8>,
    restarts: Vec<u32>,
    prev_key: Vec<u8>,
    counter: usize,
}

impl BlockBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            restarts: vec![0],
            prev_key: Vec::new(),
            counter: 0,
        }
    }

    /// Current encoded size including the (future) restart array.
    #[must_use]
    pub fn size_estimate(&self) -> usize {
        self.buf.len() + self.restarts.len() * 4 + 4
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Appends an entry. Keys must arrive in ascending order.
    pub fn add(&mut self, key: &[u8], value: &[u8]) {
        let shared = if self.counter < RESTART_INTERVAL {
            common_prefix_len(&self.prev_key, key)
        } else {
            self.restarts.push(self.buf.len() as u32);
            self.counter = 0;
            0
        };
        put_varint(&mut self.buf, shared as u64);
        put_varint(&mut self.buf, (key.len() - shared) as u64);
        put_varint(&mut self.buf, value.len() as u64);
        self.buf.extend_from_slice(&key[shared..]);
        self.buf.extend_from_slice(value);
        self.prev_key = key.to_vec();
        self.counter += 1;
    }

    /// Appends the restart array and returns the finished block bytes.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        for restart in &self.restarts {
            self.buf.write_u32::<LittleEndian>(*restart).unwrap();
        }
        self.buf
            .write_u32::<LittleEndian>(self.restarts.len() as u32)
            .unwrap();
        self.buf
    }
}

impl Default for BlockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}
