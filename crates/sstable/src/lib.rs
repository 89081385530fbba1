//! # sstable — LevelDB physical table reader
//!
//! Parses the immutable, sorted, block-structured `.ldb` table files that a
//! Firestore client SDK leaves behind as its offline cache. There is no
//! published schema or vendor reader for this data; the format here is the
//! standard LevelDB table layout, reconstructed from observed byte patterns.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ DATA BLOCK 1 (maybe snappy)  + trailer (tag u8, crc32c u32)   │
//! │ DATA BLOCK 2 ...                                              │
//! │ ...                                                           │
//! ├───────────────────────────────────────────────────────────────┤
//! │ METAINDEX BLOCK + trailer                                     │
//! ├───────────────────────────────────────────────────────────────┤
//! │ INDEX BLOCK + trailer                                         │
//! │   one entry per data block: last key → BlockHandle            │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FOOTER (48 bytes)                                             │
//! │   metaindex handle | index handle | padding | magic u64 LE    │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inside every block, keys are shared-prefix compressed with periodic
//! restart points (see [`block`]). Every key is an *internal key*: the user
//! key plus an 8-byte trailer packing a sequence number and a put/delete
//! marker (see [`format`]).
//!
//! The reader tolerates corruption at block granularity: a block with a bad
//! checksum or compression tag is logged and skipped, never fatal to the
//! file; only an unreadable footer or index abandons a file. One torn write
//! must never prevent decoding the rest of a multi-file cache.

pub mod block;
pub mod format;
mod reader;
mod writer;

pub use format::{BlockHandle, Footer, RecordKind, FOOTER_BYTES, TABLE_MAGIC};
pub use reader::{RawRecord, RecordIter, TableReader};
pub use writer::TableWriter;
