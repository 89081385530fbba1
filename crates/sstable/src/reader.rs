//! Table reader: one `.ldb` file → an ordered stream of raw records.
//!
//! Opening a table reads the whole file into memory (cache files are small,
//! and every block gets visited exactly once during a scan), parses the
//! footer, and loads the index block to learn the data-block handles in key
//! order. Iteration then replays each data block's entries, reconstructing
//! prefix-compressed keys and splitting internal keys into
//! `(user key, sequence, kind)`.
//!
//! ## Failure policy
//!
//! - Unreadable footer or index block: the whole file fails (only that file).
//! - Bad block checksum or unknown compression tag: the block is skipped and
//!   logged; the scan continues with the next block.
//! - Malformed internal key inside a good block: the record is skipped.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::block::decode_block_entries;
use crate::format::{
    split_internal_key, BlockHandle, Footer, RecordKind, BLOCK_TRAILER_BYTES, COMPRESSION_NONE,
    COMPRESSION_SNAPPY, FOOTER_BYTES,
};

/// Maximum block payload we'll allocate during reads (32 MiB). Prevents OOM
/// on corrupt handles.
const MAX_BLOCK_BYTES: u64 = 32 * 1024 * 1024;

/// One physical record from a table file, produced during the linear scan
/// and consumed immediately by the document assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// User key with the internal trailer stripped.
    pub key: Vec<u8>,
    /// Value payload (empty for deletions).
    pub value: Vec<u8>,
    /// Version ordering across files; highest wins.
    pub seq: u64,
    /// Put or delete.
    pub kind: RecordKind,
}

/// Reads one LevelDB table file as a finite sequence of [`RawRecord`]s.
pub struct TableReader {
    path: PathBuf,
    data: Vec<u8>,
    /// Data-block handles in key order, from the index block.
    blocks: Vec<BlockHandle>,
}

impl TableReader {
    /// Opens a table file, validating the footer and loading the block index.
    ///
    /// # Errors
    ///
    /// Fails if the file is smaller than a footer, the magic is wrong, or
    /// the index block itself cannot be read. Failures here abandon only
    /// this file; sibling files in the same directory still decode.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let data = std::fs::read(&path_buf)
            .with_context(|| format!("reading table file {}", path_buf.display()))?;

        if data.len() < FOOTER_BYTES {
            bail!(
                "{}: file too small for a table footer ({} bytes)",
                path_buf.display(),
                data.len()
            );
        }
        let footer = Footer::decode(&data[data.len() - FOOTER_BYTES..])
            .with_context(|| format!("{}: unreadable footer", path_buf.display()))?;

        let index_block = read_block(&data, footer.index)
            .with_context(|| format!("{}: unreadable index block", path_buf.display()))?;
        let entries = decode_block_entries(&index_block)
            .with_context(|| format!("{}: malformed index block", path_buf.display()))?;

        let mut blocks = Vec::with_capacity(entries.len());
        for (_last_key, handle_bytes) in entries {
            let mut cur = codec::Cursor::new(&handle_bytes);
            match BlockHandle::decode(&mut cur) {
                Ok(handle) => blocks.push(handle),
                Err(e) => {
                    warn!(file = %path_buf.display(), error = %e, "skipping malformed block handle");
                }
            }
        }

        Ok(Self {
            path: path_buf,
            data,
            blocks,
        })
    }

    /// Path this reader was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of data blocks listed in the index.
    #[must_use]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Iterates every record in key order. Finite; create a new reader to
    /// restart.
    #[must_use]
    pub fn iter(&self) -> RecordIter<'_> {
        RecordIter {
            reader: self,
            next_block: 0,
            entries: Vec::new().into_iter(),
        }
    }
}

/// Reads, checksums, and decompresses the block at `handle`.
fn read_block(data: &[u8], handle: BlockHandle) -> Result<Vec<u8>> {
    if handle.size > MAX_BLOCK_BYTES {
        bail!("block size {} exceeds maximum {}", handle.size, MAX_BLOCK_BYTES);
    }
    let start = handle.offset as usize;
    let end = start
        .checked_add(handle.size as usize)
        .and_then(|e| e.checked_add(BLOCK_TRAILER_BYTES))
        .filter(|e| *e <= data.len());
    let Some(end) = end else {
        bail!(
            "block handle ({}, {}) points past end of file ({} bytes)",
            handle.offset,
            handle.size,
            data.len()
        );
    };

    let payload = &data[start..start + handle.size as usize];
    let trailer = &data[start + handle.size as usize..end];
    let tag = trailer[0];
    let stored = u32::from_le_bytes(trailer[1..5].try_into().unwrap());
    let computed = crate::format::block_checksum(payload, tag);
    if stored != computed {
        bail!(
            "block checksum mismatch at offset {}: stored {:#010x}, computed {:#010x}",
            handle.offset,
            stored,
            computed
        );
    }

    match tag {
        COMPRESSION_NONE => Ok(payload.to_vec()),
        COMPRESSION_SNAPPY => snap::raw::Decoder::new()
            .decompress_vec(payload)
            .context("snappy decompression failed"),
        other => bail!("unknown block compression tag {other:#04x}"),
    }
}

/// Lazy scan over all records of one table, block by block.
pub struct RecordIter<'a> {
    reader: &'a TableReader,
    next_block: usize,
    entries: std::vec::IntoIter<(Vec<u8>, Vec<u8>)>,
}

impl Iterator for RecordIter<'_> {
    type Item = RawRecord;

    fn next(&mut self) -> Option<RawRecord> {
        loop {
            if let Some((internal_key, value)) = self.entries.next() {
                match split_internal_key(&internal_key) {
                    Some((user_key, seq, kind)) => {
                        return Some(RawRecord {
                            key: user_key.to_vec(),
                            value,
                            seq,
                            kind,
                        });
                    }
                    None => {
                        warn!(
                            file = %self.reader.path.display(),
                            key_len = internal_key.len(),
                            "skipping record with malformed internal key"
                        );
                        continue;
                    }
                }
            }

            // Current block exhausted; decode the next one, skipping any
            // block that fails its checksum or compression tag.
            loop {
                let handle = *self.reader.blocks.get(self.next_block)?;
                self.next_block += 1;
                match read_block(&self.reader.data, handle)
                    .and_then(|block| decode_block_entries(&block))
                {
                    Ok(entries) => {
                        self.entries = entries.into_iter();
                        break;
                    }
                    Err(e) => {
                        warn!(
                            file = %self.reader.path.display(),
                            offset = handle.offset,
                            error = %e,
                            "skipping unreadable block"
                        );
                    }
                }
            }
        }
    }
}
