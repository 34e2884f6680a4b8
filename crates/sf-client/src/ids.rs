//! Record identifier checksums and sequential candidates.
//!
//! Record ids are 15 case-sensitive base-62 characters. The 18-character
//! form appends a three-character checksum, one symbol per five-character
//! block, encoding which characters of the block are upper-case letters.
//!
//! ```rust
//! use auraprobe_client::ids;
//!
//! assert_eq!(ids::extend_to_18("001R00000thl8FI").unwrap(), "001R00000thl8FIIAY");
//! ```

use std::collections::BTreeSet;

use crate::error::{Error, ErrorKind, Result};

const CHECKSUM_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ012345";
const BASE62: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Width of the incrementable trailing segment (positions 10..15).
const COUNTER_WIDTH: usize = 5;
const PREFIX_LEN: usize = 10;

/// Extend a 15-character id to its 18-character checksummed form.
///
/// 18-character input is returned unchanged.
pub fn extend_to_18(id: &str) -> Result<String> {
    if id.is_empty() {
        return Err(Error::new(ErrorKind::InvalidIdentifier("no id given".into())));
    }
    if id.len() == 18 {
        return Ok(id.to_string());
    }
    if id.len() != 15 || !id.is_ascii() {
        return Err(Error::new(ErrorKind::InvalidIdentifier(format!(
            "'{id}' is not 15 characters long"
        ))));
    }

    let mut extended = String::with_capacity(18);
    extended.push_str(id);
    for block in id.as_bytes().chunks(5) {
        let mask = block
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_ascii_uppercase())
            .fold(0usize, |acc, (j, _)| acc | (1 << j));
        extended.push(CHECKSUM_ALPHABET[mask] as char);
    }
    Ok(extended)
}

/// Generate `count` ids following (or, for negative `count`, preceding) `id`.
///
/// The trailing five characters of the 15-character core are treated as a
/// base-62 counter; the first ten characters are kept. Candidates that
/// would leave the five-character range are skipped.
pub fn generate_sequential(id: &str, count: i64) -> Result<BTreeSet<String>> {
    if id.len() < 15 || !id.is_ascii() {
        return Err(Error::new(ErrorKind::InvalidIdentifier(format!(
            "'{id}' is too short to increment"
        ))));
    }

    let prefix = &id[..PREFIX_LEN];
    let start = decode_base62(&id[PREFIX_LEN..PREFIX_LEN + COUNTER_WIDTH])?;
    let direction: i64 = if count < 0 { -1 } else { 1 };
    let max = 62u64.pow(COUNTER_WIDTH as u32);

    let mut ids = BTreeSet::new();
    for i in 1..=count.unsigned_abs() {
        let step = i64::try_from(i).unwrap_or(i64::MAX).saturating_mul(direction);
        let Some(next) = (start as i64).checked_add(step) else {
            continue;
        };
        if next < 0 || next as u64 >= max {
            continue;
        }
        let candidate = format!("{prefix}{}", encode_base62(next as u64, COUNTER_WIDTH));
        ids.insert(extend_to_18(&candidate)?);
    }
    Ok(ids)
}

/// Decode a base-62 string, most significant digit first.
pub fn decode_base62(digits: &str) -> Result<u64> {
    digits.bytes().try_fold(0u64, |acc, c| {
        let value = BASE62.iter().position(|&b| b == c).ok_or_else(|| {
            Error::new(ErrorKind::InvalidIdentifier(format!(
                "'{}' is not a base-62 digit",
                c as char
            )))
        })?;
        Ok(acc * 62 + value as u64)
    })
}

/// Encode a number in base 62, left-padded with `0` to `width` characters.
pub fn encode_base62(mut num: u64, width: usize) -> String {
    let mut digits = Vec::with_capacity(width);
    while num > 0 {
        digits.push(BASE62[(num % 62) as usize]);
        num /= 62;
    }
    while digits.len() < width {
        digits.push(b'0');
    }
    digits.iter().rev().map(|&b| b as char).collect()
}
