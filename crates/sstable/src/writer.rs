//! Table writer: the mirror image of [`TableReader`](crate::TableReader).
//!
//! Exists for the container round-trip property (everything the reader
//! produces can be re-encoded and decoded back to identical bytes) and for
//! building on-disk fixtures. The cache itself is strictly read-only; this
//! writer never points at it.
//!
//! The write is crash-safe: bytes go to a `*.tmp` sibling first, are
//! fsynced, then atomically renamed into place.

use anyhow::{bail, Context, Result};
use std::fs::{rename, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::block::BlockBuilder;
use crate::format::{
    block_checksum, make_internal_key, BlockHandle, Footer, RecordKind, COMPRESSION_NONE,
    COMPRESSION_SNAPPY,
};

/// Target uncompressed size of one data block.
const BLOCK_SIZE: usize = 4096;

/// Builds a LevelDB table file from records added in any order.
///
/// Records are sorted by (user key ascending, sequence descending) before
/// writing, matching the order the reader expects.
pub struct TableWriter {
    records: Vec<(Vec<u8>, u64, RecordKind, Vec<u8>)>,
    compress: bool,
}

impl TableWriter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            compress: false,
        }
    }

    /// Enables snappy compression of data blocks. Blocks that don't shrink
    /// are stored raw, as the original container does.
    #[must_use]
    pub fn with_snappy(mut self) -> Self {
        self.compress = true;
        self
    }

    /// Queues a live record.
    pub fn put(&mut self, user_key: &[u8], seq: u64, value: &[u8]) {
        self.records
            .push((user_key.to_vec(), seq, RecordKind::Put, value.to_vec()));
    }

    /// Queues a deletion marker.
    pub fn delete(&mut self, user_key: &[u8], seq: u64) {
        self.records
            .push((user_key.to_vec(), seq, RecordKind::Delete, Vec::new()));
    }

    /// Writes the table to `path` (temp file + fsync + rename).
    ///
    /// # Errors
    ///
    /// Fails if no records were queued or on any I/O failure.
    pub fn finish<P: AsRef<Path>>(mut self, path: P) -> Result<()> {
        if self.records.is_empty() {
            bail!("refusing to write an empty table");
        }
        self.records
            .sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut file_buf: Vec<u8> = Vec::new();
        let mut index: Vec<(Vec<u8>, BlockHandle)> = Vec::new();
        let mut block = BlockBuilder::new();
        let mut last_key_in_block: Vec<u8> = Vec::new();

        for (user_key, seq, kind, value) in &self.records {
            let internal = make_internal_key(user_key, *seq, *kind);
            block.add(&internal, value);
            last_key_in_block = internal;

            if block.size_estimate() >= BLOCK_SIZE {
                let handle = append_block(
                    &mut file_buf,
                    std::mem::take(&mut block).finish(),
                    self.compress,
                );
                index.push((std::mem::take(&mut last_key_in_block), handle));
            }
        }
        if !block.is_empty() {
            let handle = append_block(&mut file_buf, block.finish(), self.compress);
            index.push((last_key_in_block, handle));
        }

        // Metaindex: present but empty (no meta blocks are written).
        let metaindex = append_block(&mut file_buf, BlockBuilder::new().finish(), false);

        let mut index_block = BlockBuilder::new();
        for (last_key, handle) in &index {
            let mut handle_bytes = Vec::new();
            handle.encode_to(&mut handle_bytes);
            index_block.add(last_key, &handle_bytes);
        }
        let index_handle = append_block(&mut file_buf, index_block.finish(), false);

        file_buf.extend_from_slice(
            &Footer {
                metaindex,
                index: index_handle,
            }
            .encode(),
        );

        let path = path.as_ref();
        let tmp = path.with_extension("tmp");
        let mut f = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(&file_buf)?;
        f.sync_all()?;
        drop(f);
        rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
        Ok(())
    }
}

impl Default for TableWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Appends one block (payload, maybe compressed, plus trailer) to the file
/// buffer, returning its handle.
fn append_block(file_buf: &mut Vec<u8>, raw: Vec<u8>, compress: bool) -> BlockHandle {
    let (payload, tag) = if compress {
        let compressed = snap::raw::Encoder::new()
            .compress_vec(&raw)
            .unwrap_or_else(|_| raw.clone());
        if compressed.len() < raw.len() {
            (compressed, COMPRESSION_SNAPPY)
        } else {
            (raw, COMPRESSION_NONE)
        }
    } else {
        (raw, COMPRESSION_NONE)
    };

    let handle = BlockHandle {
        offset: file_buf.len() as u64,
        size: payload.len() as u64,
    };
    let crc = block_checksum(&payload, tag);
    file_buf.extend_from_slice(&payload);
    file_buf.push(tag);
    file_buf.extend_from_slice(&crc.to_le_bytes());
    handle
}
