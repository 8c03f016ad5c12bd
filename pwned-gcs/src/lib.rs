//! Golomb-Coded Set storage for the Have I Been Pwned password corpus.
//!
//! This library answers "has this password hash been seen in a known
//! breach?" against roughly 850 million SHA-1 hashes without holding tens
//! of gigabytes in RAM. The set is stored as a Golomb-Coded Set (GCS): the
//! high 64 bits of each hash are normalised into `[0, N*P)`, sorted, and
//! the successive differences are Golomb-encoded with divisor `P`. The
//! result is strictly smaller than a Bloom filter at the same 1-in-`P`
//! false-positive rate and supports disk-resident random-access lookup
//! through a sparse in-memory index.
//!
//! # File Format
//!
//! A GCS file is a single bit stream followed by an index and a footer:
//!
//! - the Golomb-encoded deltas of all normalised entries, starting from
//!   zero, closed by an encoded zero delta and padded to a byte boundary;
//! - a sparse index of `(value, bit position)` checkpoints, one every
//!   `G` entries, 16 bytes each;
//! - a 40-byte footer: entry count, divisor, index byte offset, index
//!   length, and the magic `"[GCS:v0]"`. All integers are big-endian u64s.
//!
//! # Building and Querying
//!
//! [`Builder`] streams a text dump (one hex hash per line, the HIBP
//! ordered-by-hash export) through a parallel parse stage and writes the
//! finished file in one pass. [`Reader`] memory-maps the file, keeps only
//! the sparse index in memory, and answers membership queries in `O(G)`
//! bit reads worst case, a few microseconds. A false `exists` answer is
//! definitive; a true answer is wrong with probability at most 1-in-`P`.

pub mod bitio;
pub mod builder;
pub mod conversion;
pub mod error;
pub mod format;
pub mod golomb;
pub mod reader;
pub mod status;

pub use builder::{BuildSummary, Builder};
pub use conversion::{sha1_to_u64, try_u64_from_hex, u64_from_hex, u64_from_sha1_hex};
pub use error::{Error, Result};
pub use format::GCS_MAGIC;
pub use reader::Reader;
pub use status::Status;

/// Default false-positive rate, 1-in-2^24.
pub const DEFAULT_PROBABILITY: u64 = 16_777_216;

/// Default entries per sparse-index checkpoint.
pub const DEFAULT_INDEX_GRANULARITY: u64 = 1024;
