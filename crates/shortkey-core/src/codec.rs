//! Fixed-width base-36 codec.
//!
//! Values are written most-significant symbol first and left-padded with
//! `'0'` to the requested length, so `5` at length 1 (`"5"`) and at length 2
//! (`"05"`) are different strings. Keys of different lengths therefore never
//! collide, which is what lets an allocator grow its key length in place.

use crate::error::{CoreError, Result};
use crate::key::Key;

/// The ordered symbol set: `0-9` followed by `a-z`.
pub const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Number of symbols in [`ALPHABET`].
pub const BASE: u64 = ALPHABET.len() as u64;

/// The longest key whose whole space (`36^length`) still fits in a `u64`.
pub const MAX_LENGTH: usize = 12;

/// Returns `36^length`, or `None` if it does not fit in a `u64`.
pub fn space_size(length: usize) -> Option<u64> {
    let exp = u32::try_from(length).ok()?;
    BASE.checked_pow(exp)
}

/// Position of `symbol` in [`ALPHABET`].
pub fn symbol_index(symbol: u8) -> Option<u64> {
    match symbol {
        b'0'..=b'9' => Some(u64::from(symbol - b'0')),
        b'a'..=b'z' => Some(u64::from(symbol - b'a') + 10),
        _ => None,
    }
}

/// Encodes `value` as exactly `length` base-36 symbols.
///
/// Fails if `length` is zero or larger than [`MAX_LENGTH`], or if `value`
/// is outside `[0, 36^length)`. Nothing is ever truncated or wrapped.
pub fn encode(value: u64, length: usize) -> Result<Key> {
    if length == 0 || length > MAX_LENGTH {
        return Err(CoreError::InvalidLength {
            length,
            max: MAX_LENGTH,
        });
    }

    match space_size(length) {
        Some(size) if value < size => {}
        _ => return Err(CoreError::OutOfRange { value, length }),
    }

    let mut buf = [b'0'; MAX_LENGTH];
    let digits = &mut buf[..length];
    let mut rest = value;
    for slot in digits.iter_mut().rev() {
        *slot = ALPHABET[(rest % BASE) as usize];
        rest /= BASE;
    }

    // Every byte comes from ALPHABET, so the buffer is ASCII.
    let encoded = std::str::from_utf8(digits).map_err(|e| CoreError::InvalidKey(e.to_string()))?;
    Ok(Key::from_trusted(encoded))
}

/// Decodes a base-36 string back to its integer value.
///
/// Leading `'0'` symbols are accepted, so `decode("05") == decode("5")`.
pub fn decode(encoded: &str) -> Result<u64> {
    if encoded.is_empty() {
        return Err(CoreError::InvalidKey("key cannot be empty".to_string()));
    }

    encoded.bytes().try_fold(0_u64, |acc, symbol| {
        let digit = symbol_index(symbol).ok_or_else(|| {
            CoreError::InvalidKey(format!(
                "symbol {:?} is not in the alphabet: '{}'",
                symbol as char, encoded
            ))
        })?;
        acc.checked_mul(BASE)
            .and_then(|shifted| shifted.checked_add(digit))
            .ok_or_else(|| CoreError::InvalidKey(format!("value overflows u64: '{}'", encoded)))
    })
}
