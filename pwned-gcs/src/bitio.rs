//! Bit-granular reading and writing over byte streams.
//!
//! Bits are packed MSB-first within each byte: the first bit written lands in
//! bit 7 of the first output byte, and the reader mirrors that ordering. The
//! writer buffers at most one partial byte; `flush` pads it with zero bits on
//! the low end and reports how many padding bits were added so callers can
//! account for the exact stream length.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{Error, Result};

/// Adds bit-level writing to any byte sink.
///
/// Callers are responsible for invoking [`BitWriter::flush`]; dropping the
/// writer with a partial byte cached loses those bits.
pub struct BitWriter<W: Write> {
    inner: W,
    /// Unwritten bits, left-aligned within the byte.
    buffer: u8,
    /// Number of cached bits in `buffer`.
    cached: u8,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, buffer: 0, cached: 0 }
    }

    /// Writes the low `n` bits of `value`, most-significant-first.
    pub fn write_bits(&mut self, n: u8, value: u64) -> Result<()> {
        if n > 64 {
            return Err(Error::InvalidWidth(u64::from(n)));
        }
        if n == 0 {
            return Ok(());
        }

        let mask = if n == 64 { u64::MAX } else { (1u64 << n) - 1 };
        self.write_bits_unmasked(n, value & mask)
    }

    // `value` must not have bits set at position `n` or above; `write_bits`
    // masks before delegating here.
    fn write_bits_unmasked(&mut self, mut n: u8, value: u64) -> Result<()> {
        let new_bits = self.cached + n;
        if new_bits < 8 {
            // Fits in the cache, nothing reaches the sink yet.
            self.buffer |= (value as u8) << (8 - new_bits);
            self.cached = new_bits;
            return Ok(());
        }

        if new_bits > 8 {
            // Fill the cached byte, emit whole bytes, keep the remainder.
            let free = 8 - self.cached;
            self.write_byte(self.buffer | (value >> (n - free)) as u8)?;
            n -= free;

            while n >= 8 {
                n -= 8;
                self.write_byte((value >> n) as u8)?;
            }

            if n > 0 {
                self.buffer = ((value as u8) & ((1 << n) - 1)) << (8 - n);
                self.cached = n;
            } else {
                self.buffer = 0;
                self.cached = 0;
            }
            return Ok(());
        }

        // The write fills the cached byte exactly.
        let full = self.buffer | value as u8;
        self.buffer = 0;
        self.cached = 0;
        self.write_byte(full)
    }

    /// Aligns the stream to a byte boundary, padding with zero bits, flushes
    /// the underlying sink, and returns the number of padding bits (0..=7).
    ///
    /// The sum of all `write_bits` widths plus the returned padding is the
    /// total number of bits delivered to the sink, always a multiple of 8.
    pub fn flush(&mut self) -> Result<u64> {
        let mut padding = 0;
        if self.cached > 0 {
            let byte = self.buffer;
            padding = u64::from(8 - self.cached);
            self.buffer = 0;
            self.cached = 0;
            self.write_byte(byte)?;
        }
        self.inner.flush()?;
        Ok(padding)
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.inner.write_all(&[byte])?;
        Ok(())
    }
}

/// Adds bit-level reading to any seekable byte source.
pub struct BitReader<R: Read + Seek> {
    inner: R,
    /// Unconsumed bits of the current byte, right-aligned.
    buffer: u8,
    /// Number of unconsumed bits in `buffer`.
    unused: u8,
}

impl<R: Read + Seek> BitReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, buffer: 0, unused: 0 }
    }

    /// Clears cached bits without moving the byte cursor. The next read
    /// loads fresh data starting at the current byte position.
    pub fn reset(&mut self) {
        self.buffer = 0;
        self.unused = 0;
    }

    /// Returns the next `n` bits as the low bits of a u64, MSB-first.
    pub fn read_bits(&mut self, n: u8) -> Result<u64> {
        if n > 64 {
            return Err(Error::InvalidWidth(u64::from(n)));
        }

        let mut ret = 0u64;
        let mut remaining = n;

        while remaining > self.unused {
            if self.unused > 0 {
                ret |= u64::from(self.buffer) << (remaining - self.unused);
                remaining -= self.unused;
            }

            let mut byte = [0u8; 1];
            self.inner.read_exact(&mut byte)?;
            self.buffer = byte[0];
            self.unused = 8;
        }

        if remaining > 0 {
            ret |= u64::from(self.buffer) >> (self.unused - remaining);
            self.buffer &= (1 << (self.unused - remaining)) - 1;
            self.unused -= remaining;
        }

        Ok(ret)
    }

    /// Seeks to the given *bit* position and returns it.
    ///
    /// Only `SeekFrom::Start` and `SeekFrom::End` with a strictly negative
    /// offset are supported; anything else is [`Error::UnsupportedSeek`].
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        match pos {
            SeekFrom::Start(offset) => {
                self.reset();
                self.inner.seek(SeekFrom::Start(offset / 8))?;
                let partial = (offset % 8) as u8;
                if partial > 0 {
                    self.read_bits(partial)?;
                }
                Ok(offset)
            }
            SeekFrom::End(offset) if offset < 0 => {
                self.reset();
                let mut byte_off = offset / 8;
                let partial = 8 - (offset % 8);
                if partial > 0 {
                    byte_off -= 1;
                }
                let base = self.inner.seek(SeekFrom::End(byte_off))?;
                self.read_bits(partial as u8)?;
                Ok(base * 8 + partial as u64)
            }
            _ => Err(Error::UnsupportedSeek),
        }
    }
}
