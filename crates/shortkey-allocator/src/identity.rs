use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// This replica's ordinal among a fixed number of replicas.
///
/// Supplied once at startup by whatever places the process (for example a
/// stateful-set ordinal) and immutable afterwards. Two processes must never
/// run with the same identity under the same replica count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplicaIdentity {
    index: u64,
    count: u64,
}

impl ReplicaIdentity {
    pub fn new(index: u64, count: u64) -> Result<Self, Error> {
        if count == 0 {
            return Err(Error::ZeroReplicas);
        }
        if index >= count {
            return Err(Error::IndexOutOfRange { index, count });
        }
        Ok(Self { index, count })
    }

    /// Derives the index from the trailing decimal digits of a hostname,
    /// e.g. `shortener-2` is replica 2.
    pub fn from_hostname(hostname: &str, count: u64) -> Result<Self, Error> {
        let trimmed = hostname.trim();
        let digits = trimmed
            .bytes()
            .rev()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            return Err(Error::MissingOrdinal(hostname.to_string()));
        }

        let ordinal = &trimmed[trimmed.len() - digits..];
        let index = ordinal
            .parse::<u64>()
            .map_err(|_| Error::OrdinalOverflow(hostname.to_string()))?;
        Self::new(index, count)
    }

    /// A single-replica deployment.
    pub fn standalone() -> Self {
        Self { index: 0, count: 1 }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.count
    }
}

impl fmt::Display for ReplicaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "replica {}/{}", self.index, self.count)
    }
}
