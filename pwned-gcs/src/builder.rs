//! Builds a GCS file from a text dump of hex hashes.
//!
//! One record per input line; the first 16 characters of each line are the
//! hex prefix of a SHA-1 digest and everything after (e.g. `:<count>`) is
//! ignored. The scan accumulates the parsed u64s into one vector, then
//! finalisation normalises, sorts, deduplicates and Golomb-encodes the
//! successive differences, followed by the sparse index and footer.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

use rayon::iter::{ParallelBridge, ParallelIterator};
use tracing::{debug, trace, warn};

use crate::conversion::try_u64_from_hex;
use crate::error::{Error, Result};
use crate::format::{self, Footer, IndexPair};
use crate::golomb::GolombEncoder;
use crate::status::Status;

/// Lines per worker batch.
const BATCH_LINES: usize = 64 * 1024;

/// Sample size for the line-count estimate (16 MiB).
const ESTIMATE_LIMIT: u64 = 16 * 1024 * 1024;

/// What a finished build wrote, as recorded in the footer.
#[derive(Debug, Clone, Copy)]
pub struct BuildSummary {
    /// Entry count stored in the footer (the normalisation modulus / P).
    pub entries: u64,
    /// Entries actually encoded after duplicate removal.
    pub unique: u64,
    /// Byte offset where the index begins.
    pub end_of_data: u64,
    /// Index pairs stored on disk.
    pub index_len: u64,
}

/// Builder for a new GCS file database.
///
/// `probability` is the false-positive rate for queries, 1-in-p.
/// `index_granularity` is the entries per index point (16 bytes each).
pub struct Builder {
    probability: u64,
    index_granularity: u64,
    values: Vec<u64>,
    status: Status,
}

impl Builder {
    pub fn new(probability: u64, index_granularity: u64) -> Self {
        assert!(probability >= 1, "false-positive rate must be at least 1");
        Self {
            probability,
            index_granularity,
            values: Vec::new(),
            status: Status::new(),
        }
    }

    /// Adds a single entry to the set being built.
    pub fn add(&mut self, entry: u64) {
        self.values.push(entry);
    }

    /// Number of entries accumulated so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Scans a hash dump, parsing the first 16 hex characters of every line
    /// across a worker pool and appending the u64s to the shared vector.
    ///
    /// Parsing runs in parallel; only the vector append is serialised, so
    /// the workers stay busy while one of them holds the lock. The final
    /// order is irrelevant because finalisation sorts.
    ///
    /// Lines shorter than 16 characters are skipped; a line whose prefix
    /// is not valid hex logs the offender and aborts the scan with
    /// [`Error::InvalidHex`].
    pub fn ingest(&mut self, mut input: File) -> Result<()> {
        let estimated = estimate_file_lines(&mut input)?;
        debug!("estimated {} lines in input", estimated);
        self.values.reserve(estimated as usize);
        self.status.stage_work("Read", estimated);

        let values = Mutex::new(std::mem::take(&mut self.values));
        let status = &self.status;

        LineBatches::new(BufReader::new(input))
            .par_bridge()
            .try_for_each(|batch| -> Result<()> {
                let batch = batch?;
                let mut records = Vec::with_capacity(batch.len());
                for line in &batch {
                    if line.len() < 16 {
                        trace!("skipping line {:?}", String::from_utf8_lossy(line));
                        continue;
                    }
                    match try_u64_from_hex(line) {
                        Ok(hash) => records.push(hash),
                        Err(e) => {
                            warn!("invalid hex in line {:?}", String::from_utf8_lossy(line));
                            return Err(e);
                        }
                    }
                }

                values.lock().unwrap().extend_from_slice(&records);
                status.add_work(batch.len() as u64);
                Ok(())
            })?;

        self.values = values.into_inner().unwrap();
        Ok(())
    }

    /// Writes the finished set: bit stream, terminator, sparse index and
    /// footer. Consumes the builder; the value vector is released on return.
    pub fn finalize<W: Write>(mut self, out: W) -> Result<BuildSummary> {
        let num = self.values.len() as u64;
        debug!("database will have {} items", num);

        // The modulus must survive into the footer unchanged: the reader
        // recomputes it from `num`, so dedup below must not shrink it.
        let np = num
            .checked_mul(self.probability)
            .ok_or(Error::CapacityOverflow { num, probability: self.probability })?;

        self.status.stage("Normalise");
        if np > 0 {
            for v in &mut self.values {
                *v %= np;
            }
        }

        self.status.stage("Sort");
        self.values.sort_unstable();

        self.status.stage("Deduplicate");
        self.values.dedup();

        // A normalised value of zero would encode as the stream terminator,
        // so it cannot be represented; drop it to keep the stream well
        // formed. Lookups answer false for a normalised value of zero.
        if self.values.first() == Some(&0) {
            self.values.remove(0);
        }

        let mut out = BufWriter::new(out);
        let mut index = Vec::with_capacity(index_capacity(
            self.values.len(),
            self.index_granularity,
        ));
        index.push(IndexPair { value: 0, bit_pos: 0 });

        self.status.stage_work("Encode", self.values.len() as u64);
        let mut encoder = GolombEncoder::new(&mut out, self.probability);
        let mut total_bits = 0u64;
        let mut prev = 0u64;
        for (i, &value) in self.values.iter().enumerate() {
            total_bits += encoder.encode(value - prev)?;
            prev = value;

            if self.index_granularity > 0 && i as u64 % self.index_granularity == 0 {
                index.push(IndexPair { value, bit_pos: total_bits });
            }

            self.status.incr();
        }

        // Delimiting zero so scans know where the stream ends.
        total_bits += encoder.encode(0)?;
        let padding = encoder.finalize()?;
        let end_of_data = (total_bits + padding) / 8;
        debug!("end of data: {}", end_of_data);

        self.status.stage("Write Index");
        let index_len = index.len() as u64 - 1;
        debug!("index will have {} items", index_len);

        // The `(0, 0)` head is synthetic; the reader re-creates it at load.
        format::write_index(&mut out, &index[1..])?;

        let footer = Footer {
            num,
            probability: self.probability,
            end_of_data,
            index_len,
        };
        footer.write_to(&mut out)?;
        out.flush()?;

        self.status.done();
        Ok(BuildSummary {
            entries: num,
            unique: self.values.len() as u64,
            end_of_data,
            index_len,
        })
    }
}

fn index_capacity(entries: usize, granularity: u64) -> usize {
    if granularity == 0 {
        1
    } else {
        entries / granularity as usize + 2
    }
}

/// Estimates the line count from a 16 MiB sample, extrapolated by file
/// size. Accurate to within about 1% for uniform-length lines; the exact
/// count is re-measured before finalisation anyway.
fn estimate_file_lines(file: &mut File) -> Result<u64> {
    let size = file.metadata()?.len();
    let sample_len = size.min(ESTIMATE_LIMIT);
    if sample_len == 0 {
        return Ok(0);
    }

    let mut buffer = vec![0u8; sample_len as usize];
    file.read_exact(&mut buffer)?;
    // Rewind so the scan does not miss the sampled chunk.
    file.seek(SeekFrom::Start(0))?;

    let sample = buffer.iter().filter(|&&b| b == b'\n').count() as u64;
    Ok(sample * (size / sample_len))
}

/// Yields lines in fixed-size batches so workers amortise dispatch costs.
struct LineBatches<R: BufRead> {
    reader: R,
    done: bool,
}

impl<R: BufRead> LineBatches<R> {
    fn new(reader: R) -> Self {
        Self { reader, done: false }
    }
}

impl<R: BufRead> Iterator for LineBatches<R> {
    type Item = std::io::Result<Vec<Vec<u8>>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::with_capacity(BATCH_LINES);
        let mut line = Vec::new();
        loop {
            line.clear();
            match self.reader.read_until(b'\n', &mut line) {
                Ok(0) => {
                    self.done = true;
                    break;
                }
                Ok(_) => {
                    while matches!(line.last(), Some(b'\n' | b'\r')) {
                        line.pop();
                    }
                    batch.push(std::mem::take(&mut line));
                    if batch.len() == BATCH_LINES {
                        break;
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}
