//! On-disk layout: the 40-byte footer and the sparse index.
//!
//! Everything numeric is a big-endian u64. The footer sits at the very end
//! of the file so a reader can locate the index without scanning the bit
//! stream:
//!
//! ```text
//! [ bit stream, byte aligned ]
//! [ index: index_len x (value: u64, bit_pos: u64) ]
//! [ footer: num, probability, end_of_data, index_len, "[GCS:v0]" ]
//! ```

use std::io::Write;

use crate::error::{Error, Result};

/// Identifies the format version at the end of every GCS file.
pub const GCS_MAGIC: &[u8; 8] = b"[GCS:v0]";

/// Footer size in bytes: four u64 fields plus the magic.
pub const FOOTER_LEN: usize = 40;

/// Bytes per serialised index pair.
pub const INDEX_PAIR_LEN: usize = 16;

/// A sparse-index checkpoint: a stored value and the absolute bit offset
/// just past its encoded delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexPair {
    pub value: u64,
    pub bit_pos: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    /// Entry count, which is also the normalisation modulus divided by
    /// `probability`.
    pub num: u64,
    /// Inverse false-positive rate (the Golomb divisor).
    pub probability: u64,
    /// Byte offset where the index begins (size of the padded bit stream).
    pub end_of_data: u64,
    /// Number of index pairs stored on disk. The synthetic `(0, 0)` head is
    /// never written and is not counted here.
    pub index_len: u64,
}

impl Footer {
    /// Parses a footer from the last [`FOOTER_LEN`] bytes of a file.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < FOOTER_LEN {
            return Err(Error::TruncatedFile);
        }
        let buf = &buf[buf.len() - FOOTER_LEN..];
        if &buf[32..40] != GCS_MAGIC {
            return Err(Error::NotGcs);
        }

        Ok(Self {
            num: read_u64(buf, 0),
            probability: read_u64(buf, 8),
            end_of_data: read_u64(buf, 16),
            index_len: read_u64(buf, 24),
        })
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&self.num.to_be_bytes())?;
        out.write_all(&self.probability.to_be_bytes())?;
        out.write_all(&self.end_of_data.to_be_bytes())?;
        out.write_all(&self.index_len.to_be_bytes())?;
        out.write_all(GCS_MAGIC)?;
        Ok(())
    }
}

fn read_u64(buf: &[u8], offset: usize) -> u64 {
    u64::from_be_bytes(buf[offset..offset + 8].try_into().expect("8-byte slice"))
}

/// Serialises index pairs as consecutive big-endian `(value, bit_pos)` u64s.
pub fn write_index<W: Write>(out: &mut W, index: &[IndexPair]) -> Result<()> {
    for pair in index {
        out.write_all(&pair.value.to_be_bytes())?;
        out.write_all(&pair.bit_pos.to_be_bytes())?;
    }
    Ok(())
}

/// Parses `index_len` pairs, prepending the synthetic `(0, 0)` head the
/// lookup path relies on.
pub fn parse_index(buf: &[u8], index_len: u64) -> Result<Vec<IndexPair>> {
    let wanted = (index_len as usize)
        .checked_mul(INDEX_PAIR_LEN)
        .ok_or(Error::TruncatedFile)?;
    if buf.len() < wanted {
        return Err(Error::TruncatedFile);
    }

    let mut index = Vec::with_capacity(index_len as usize + 1);
    index.push(IndexPair { value: 0, bit_pos: 0 });
    for pair in buf[..wanted].chunks_exact(INDEX_PAIR_LEN) {
        index.push(IndexPair {
            value: read_u64(pair, 0),
            bit_pos: read_u64(pair, 8),
        });
    }

    Ok(index)
}
