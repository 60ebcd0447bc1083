use crate::codec::{symbol_index, BASE, MAX_LENGTH};
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Display;
use std::str::FromStr;

/// A fixed-width base-36 identifier for a stored resource.
///
/// Keys are lowercase only and between 1 and [`MAX_LENGTH`] symbols long.
/// The length is part of the identity: `"05"` and `"5"` are different keys.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(SmolStr);

impl Key {
    /// Parses and validates a key received from outside the allocator.
    pub fn parse(key: &str) -> Result<Self> {
        Self::validate(key)?;
        Ok(Self(SmolStr::new(key)))
    }

    /// Wraps a string produced by the codec.
    pub(crate) fn from_trusted(key: &str) -> Self {
        Self(SmolStr::new(key))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of symbols in the key.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The integer this key encodes.
    pub fn value(&self) -> u64 {
        // Construction guarantees every symbol is in the alphabet and the
        // length is at most MAX_LENGTH, so this cannot overflow.
        self.0
            .bytes()
            .fold(0, |acc, symbol| acc * BASE + symbol_index(symbol).unwrap_or(0))
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }

    fn validate(key: &str) -> Result<()> {
        if key.is_empty() || key.len() > MAX_LENGTH {
            return Err(CoreError::InvalidKey(format!(
                "length must be between 1 and {}, got {}",
                MAX_LENGTH,
                key.len()
            )));
        }

        if !key.bytes().all(|symbol| symbol_index(symbol).is_some()) {
            return Err(CoreError::InvalidKey(format!(
                "must contain only digits and lowercase letters: '{}'",
                key
            )));
        }

        Ok(())
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Key").field(&self.0).finish()
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Key {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for Key {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = SmolStr::deserialize(deserializer)?;
        Key::parse(&s).map_err(serde::de::Error::custom)
    }
}
