//! Downloads the Have I Been Pwned password hash database into a single
//! text dump suitable for building a GCS file with `pwned-gcs`.
//!
//! The HIBP API serves hashes through k-anonymity ranges: one request per
//! 5-character hex prefix (00000-FFFFF), each returning the 35-character
//! suffixes seen under that prefix. This crate fans the 1,048,576 range
//! requests out over concurrent workers and funnels the responses through a
//! single writer that reassembles full 40-character hashes, one per line:
//!
//! ```text
//! 5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8:10437277
//! ```
//!
//! Ranges land in whatever order the workers finish. The GCS builder sorts
//! its input anyway, so no effort is spent re-ordering here.

pub mod conversion;
pub mod error;
pub mod worker;

pub use conversion::prefix_to_hex;
pub use error::Error;
pub use worker::{download_range, worker, write_dump, RangeBody, MAX_RETRIES, RETRY_BASE_DELAY_MS};

/// Total number of hash ranges (16^5 = 1,048,576)
pub const TOTAL_PREFIXES: u32 = 0x100000;
