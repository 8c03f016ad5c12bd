//! Conversions from SHA-1 digests and hex dumps to the u64 entry space.
//!
//! The set stores the high 64 bits of a SHA-1 digest, big-endian. Text
//! inputs carry those as the first 16 hex characters of a line.

use std::sync::LazyLock;

use regex::Regex;
use sha1::{Digest, Sha1};

use crate::error::{Error, Result};

static SHA1_HEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Fa-f0-9]{40}$").expect("valid regex"));

#[inline]
fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

/// Convert hex ASCII character to nibble value (0-15)
///
/// Non-hex input is a programming error in the calling path; callers
/// validate first ([`u64_from_sha1_hex`] on the query surface), and
/// untrusted dump lines go through [`try_u64_from_hex`] instead.
#[inline]
pub fn hex_to_nibble(c: u8) -> u8 {
    nibble(c).unwrap_or_else(|| panic!("invalid hex char: {}", c as char))
}

/// Convert the first 16 hex characters of `src` into a big-endian u64.
///
/// Panics on non-hex input; use [`try_u64_from_hex`] for data that has
/// not been validated.
#[inline]
pub fn u64_from_hex(src: &[u8]) -> u64 {
    src[..16]
        .iter()
        .fold(0u64, |acc, &c| (acc << 4) | u64::from(hex_to_nibble(c)))
}

/// Convert the first 16 hex characters of `src` into a big-endian u64,
/// failing with [`Error::InvalidHex`] if `src` is too short or contains a
/// non-hex character. This is the parse used for untrusted dump lines.
pub fn try_u64_from_hex(src: &[u8]) -> Result<u64> {
    if src.len() < 16 {
        return Err(Error::InvalidHex);
    }

    let mut acc = 0u64;
    for &c in &src[..16] {
        let n = nibble(c).ok_or(Error::InvalidHex)?;
        acc = (acc << 4) | u64::from(n);
    }
    Ok(acc)
}

/// Convert a full 40-character SHA-1 hex string into the u64 entry value.
///
/// Fails with [`Error::InvalidHex`] unless the input is exactly 40 hex
/// characters (either case).
pub fn u64_from_sha1_hex(hash: &str) -> Result<u64> {
    if !SHA1_HEX.is_match(hash) {
        return Err(Error::InvalidHex);
    }
    Ok(u64_from_hex(hash.as_bytes()))
}

/// SHA-1 a plaintext password and take the high 8 bytes big-endian.
pub fn sha1_to_u64(password: &str) -> u64 {
    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    let hash: [u8; 20] = hasher.finalize().into();
    u64::from_be_bytes(hash[..8].try_into().expect("8-byte slice"))
}
