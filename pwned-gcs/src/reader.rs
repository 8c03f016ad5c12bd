//! Read-only access to a GCS file: footer/index load and membership
//! queries.
//!
//! The file is memory-mapped once at open. Every lookup walks a private
//! bit cursor over the shared immutable mapping, so a single `Reader`
//! behind an `Arc` serves any number of concurrent callers without
//! per-query file handles or shared cursor state.

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use memmap2::Mmap;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::format::{parse_index, Footer, IndexPair, FOOTER_LEN};
use crate::golomb::GolombDecoder;

#[derive(Debug)]
pub struct Reader {
    map: Mmap,
    num: u64,
    probability: u64,
    /// Normalisation modulus, `num * probability`.
    np: u64,
    end_of_data: u64,
    index: Vec<IndexPair>,
}

impl Reader {
    /// Opens a GCS file, parsing the footer and loading the sparse index
    /// into memory. The whole data section stays on disk; only the mapping
    /// is retained, and the file handle is released before returning.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let map = unsafe { Mmap::map(&file)? };
        drop(file);

        let footer = Footer::parse(&map)?;
        debug!(
            num = footer.num,
            probability = footer.probability,
            end_of_data = footer.end_of_data,
            index_len = footer.index_len,
            "parsed footer"
        );

        if footer.num > 0 && footer.probability == 0 {
            return Err(Error::NotGcs);
        }
        let np = footer
            .num
            .checked_mul(footer.probability)
            .ok_or(Error::CapacityOverflow {
                num: footer.num,
                probability: footer.probability,
            })?;

        let index_end = map.len() - FOOTER_LEN;
        let data_end = footer.end_of_data as usize;
        if data_end > index_end {
            return Err(Error::TruncatedFile);
        }
        let index = parse_index(&map[data_end..index_end], footer.index_len)?;

        info!(
            "ready for queries on {} items with a 1-in-{} false-positive rate",
            footer.num, footer.probability
        );

        Ok(Self {
            map,
            num: footer.num,
            probability: footer.probability,
            np,
            end_of_data: footer.end_of_data,
            index,
        })
    }

    /// Entry count recorded in the footer.
    pub fn num(&self) -> u64 {
        self.num
    }

    /// Inverse false-positive rate recorded in the footer.
    pub fn probability(&self) -> u64 {
        self.probability
    }

    /// Probabilistic membership: `false` is definitive, `true` is wrong
    /// with probability at most 1-in-`probability`.
    pub fn exists(&self, target: u64) -> Result<bool> {
        if self.num == 0 {
            return Ok(false);
        }

        let h = target % self.np;
        if h == 0 {
            // A normalised value of zero would collide with the stream
            // terminator, so zero is never stored.
            return Ok(false);
        }

        // An exact hit on a real checkpoint needs no stream read. The
        // synthetic head only matches h == 0, already handled above.
        let start = match self.index.binary_search_by_key(&h, |pair| pair.value) {
            Ok(_) => return Ok(true),
            Err(pos) => self.index[pos - 1],
        };

        let data = &self.map[..self.end_of_data as usize];
        let mut decoder = GolombDecoder::new(Cursor::new(data), self.probability);
        decoder.seek(start.bit_pos)?;

        let mut last = start.value;
        while last < h {
            let delta = decoder.decode()?;
            if delta == 0 {
                // End of stream before reaching h.
                break;
            }
            last += delta;
        }

        Ok(last == h)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Reader::open(dir.path().join("missing.gcs")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_open_not_gcs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-gcs.bin");
        let mut file = File::create(&path).unwrap();
        file.write_all(&[0xABu8; 64]).unwrap();
        drop(file);

        assert!(matches!(Reader::open(&path), Err(Error::NotGcs)));
    }

    #[test]
    fn test_open_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.gcs");
        let mut file = File::create(&path).unwrap();
        file.write_all(&[0u8; 10]).unwrap();
        drop(file);

        assert!(matches!(Reader::open(&path), Err(Error::TruncatedFile)));
    }
}
