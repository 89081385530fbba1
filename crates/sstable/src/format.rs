//! LevelDB table format constants and footer/handle helpers.
//!
//! ## Footer (48 bytes, always last)
//!
//! ```text
//! [metaindex handle: varint64 offset + varint64 size]
//! [index handle:     varint64 offset + varint64 size]
//! [zero padding to 40 bytes]
//! [magic: u64 LE = 0xdb4775248b80fb57]
//! ```
//!
//! ## Block trailer (5 bytes after every on-disk block)
//!
//! ```text
//! [compression tag: u8][masked crc32c: u32 LE]
//! ```
//!
//! The CRC covers the block payload **plus** the compression tag, and is
//! stored masked: `rotr(crc, 15) + 0xa282ead8`. Masking keeps a CRC computed
//! over bytes that themselves contain stored CRCs well-distributed.
//!
//! ## Internal keys
//!
//! ```text
//! [user key][trailer: u64 LE = (sequence << 8) | kind]
//! ```
//!
//! `kind` 1 is a live value ("put"), 0 a deletion. The sequence number
//! orders multiple versions of the same user key across files.

use codec::Cursor;

/// Magic number identifying a LevelDB table file footer.
pub const TABLE_MAGIC: u64 = 0xdb47_7524_8b80_fb57;

/// Size of the fixed footer in bytes: 2 × max-encoded handle (40) + magic (8).
pub const FOOTER_BYTES: usize = 48;

/// Size of the per-block trailer: compression tag (1) + masked CRC32C (4).
pub const BLOCK_TRAILER_BYTES: usize = 5;

/// Size of the internal-key trailer: `(sequence << 8) | kind` as u64 LE.
pub const INTERNAL_KEY_TRAILER_BYTES: usize = 8;

/// Block compression tag: stored bytes are the raw block.
pub const COMPRESSION_NONE: u8 = 0;

/// Block compression tag: stored bytes are snappy-compressed.
pub const COMPRESSION_SNAPPY: u8 = 1;

/// Delta added while masking a CRC32C for storage.
const CRC_MASK_DELTA: u32 = 0xa282_ead8;

/// Masks a raw CRC32C for on-disk storage.
#[must_use]
pub fn mask_crc(crc: u32) -> u32 {
    ((crc >> 15) | (crc << 17)).wrapping_add(CRC_MASK_DELTA)
}

/// Reverses [`mask_crc`], recovering the raw CRC32C.
#[must_use]
pub fn unmask_crc(masked: u32) -> u32 {
    let rot = masked.wrapping_sub(CRC_MASK_DELTA);
    (rot >> 17) | (rot << 15)
}

/// Computes the masked checksum stored in a block trailer: CRC32C over the
/// block payload followed by the compression tag byte.
#[must_use]
pub fn block_checksum(payload: &[u8], compression_tag: u8) -> u32 {
    let crc = crc32c::crc32c(payload);
    mask_crc(crc32c::crc32c_append(crc, &[compression_tag]))
}

/// Location of a block inside the file: byte offset and payload size
/// (excluding the 5-byte trailer). Encoded as two varint64s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHandle {
    pub offset: u64,
    pub size: u64,
}

impl BlockHandle {
    /// Decodes a handle from the cursor's current position.
    pub fn decode(cur: &mut Cursor<'_>) -> codec::Result<Self> {
        let offset = cur.read_varint()?;
        let size = cur.read_varint()?;
        Ok(Self { offset, size })
    }

    /// Appends the varint encoding of this handle to `out`.
    pub fn encode_to(&self, out: &mut Vec<u8>) {
        put_varint(out, self.offset);
        put_varint(out, self.size);
    }
}

/// Appends `value` to `out` as a base-128 varint.
pub fn put_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Parsed table footer: handles for the metaindex and index blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub metaindex: BlockHandle,
    pub index: BlockHandle,
}

impl Footer {
    /// Parses the footer from the final [`FOOTER_BYTES`] of a file.
    ///
    /// # Errors
    ///
    /// Fails if `tail` is not exactly footer-sized, the magic is wrong, or
    /// either handle is truncated. An unreadable footer fails only the file
    /// it came from — the caller moves on to the next one.
    pub fn decode(tail: &[u8]) -> anyhow::Result<Self> {
        anyhow::ensure!(
            tail.len() == FOOTER_BYTES,
            "footer must be exactly {FOOTER_BYTES} bytes, got {}",
            tail.len()
        );
        let magic = u64::from_le_bytes(tail[FOOTER_BYTES - 8..].try_into().unwrap());
        anyhow::ensure!(
            magic == TABLE_MAGIC,
            "bad table magic: {magic:#018x} (expected {TABLE_MAGIC:#018x})"
        );
        let mut cur = Cursor::new(&tail[..FOOTER_BYTES - 8]);
        let metaindex = BlockHandle::decode(&mut cur)
            .map_err(|e| anyhow::anyhow!("truncated metaindex handle: {e}"))?;
        let index = BlockHandle::decode(&mut cur)
            .map_err(|e| anyhow::anyhow!("truncated index handle: {e}"))?;
        Ok(Self { metaindex, index })
    }

    /// Encodes the footer as exactly [`FOOTER_BYTES`] bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FOOTER_BYTES);
        self.metaindex.encode_to(&mut out);
        self.index.encode_to(&mut out);
        out.resize(FOOTER_BYTES - 8, 0);
        out.extend_from_slice(&TABLE_MAGIC.to_le_bytes());
        out
    }
}

/// Whether an internal key records a live value or a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Delete,
    Put,
}

/// Splits an internal key into `(user_key, sequence, kind)`.
///
/// Returns `None` for keys too short to carry the 8-byte trailer or with an
/// unknown kind byte — such records are skipped, never guessed at.
#[must_use]
pub fn split_internal_key(internal: &[u8]) -> Option<(&[u8], u64, RecordKind)> {
    if internal.len() < INTERNAL_KEY_TRAILER_BYTES {
        return None;
    }
    let split = internal.len() - INTERNAL_KEY_TRAILER_BYTES;
    let trailer = u64::from_le_bytes(internal[split..].try_into().unwrap());
    let kind = match trailer & 0xff {
        0 => RecordKind::Delete,
        1 => RecordKind::Put,
        _ => return None,
    };
    Some((&internal[..split], trailer >> 8, kind))
}

/// Builds an internal key from a user key, sequence number, and kind.
#[must_use]
pub fn make_internal_key(user_key: &[u8], seq: u64, kind: RecordKind) -> Vec<u8> {
    let mut out = Vec::with_capacity(user_key.len() + INTERNAL_KEY_TRAILER_BYTES);
    out.extend_from_slice(user_key);
    let tag = match kind {
        RecordKind::Delete => 0u64,
        RecordKind::Put => 1u64,
    };
    out.extend_from_slice(&((seq << 8) | tag).to_le_bytes());
    out
}
