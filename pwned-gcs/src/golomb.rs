//! Golomb (Rice) coding of non-negative integers.
//!
//! A value is split by the divisor `P` into quotient and remainder; the
//! quotient is written in unary (`q` one-bits then a zero bit) followed by
//! the remainder in exactly `ceil(log2 P)` binary bits. Sorted deltas of
//! values drawn roughly uniformly from `[0, N*P)` then cost about
//! `log2(P) + 2` bits each, close to the entropy limit for a 1-in-P
//! false-positive rate.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::bitio::{BitReader, BitWriter};
use crate::error::{Error, Result};

/// Number of bits needed for a remainder in `[0, probability)`.
pub(crate) fn log2_ceil(probability: u64) -> u8 {
    (64 - (probability - 1).leading_zeros()) as u8
}

pub struct GolombEncoder<W: Write> {
    inner: BitWriter<W>,
    probability: u64,
    log2p: u8,
}

impl<W: Write> GolombEncoder<W> {
    pub fn new(out: W, probability: u64) -> Self {
        assert!(probability >= 1, "divisor must be at least 1");
        Self {
            inner: BitWriter::new(out),
            probability,
            log2p: log2_ceil(probability),
        }
    }

    /// Encodes `value` and returns the number of bits written
    /// (`q + 1 + log2p`). A quotient whose unary prefix would not fit in a
    /// single 64-bit write fails with [`Error::InvalidWidth`].
    pub fn encode(&mut self, value: u64) -> Result<u64> {
        let q = value / self.probability;
        let r = value % self.probability;

        if q + 1 > 64 {
            return Err(Error::InvalidWidth(q + 1));
        }

        // q one-bits followed by a terminating zero bit.
        self.inner.write_bits((q + 1) as u8, ((1u64 << q) - 1) << 1)?;
        self.inner.write_bits(self.log2p, r)?;

        Ok(q + 1 + u64::from(self.log2p))
    }

    /// Byte-aligns and flushes the underlying stream, returning the number
    /// of zero padding bits written.
    pub fn finalize(mut self) -> Result<u64> {
        self.inner.flush()
    }
}

pub struct GolombDecoder<R: Read + Seek> {
    inner: BitReader<R>,
    probability: u64,
    log2p: u8,
}

impl<R: Read + Seek> GolombDecoder<R> {
    pub fn new(source: R, probability: u64) -> Self {
        assert!(probability >= 1, "divisor must be at least 1");
        Self {
            inner: BitReader::new(source),
            probability,
            log2p: log2_ceil(probability),
        }
    }

    /// Positions the decoder at an absolute bit offset.
    pub fn seek(&mut self, bit_pos: u64) -> Result<u64> {
        self.inner.seek(SeekFrom::Start(bit_pos))
    }

    /// Decodes the next value. A result of zero is the stream terminator
    /// written by the builder.
    pub fn decode(&mut self) -> Result<u64> {
        let mut value = 0u64;
        while self.inner.read_bits(1)? == 1 {
            value += self.probability;
        }
        value += self.inner.read_bits(self.log2p)?;
        Ok(value)
    }
}
