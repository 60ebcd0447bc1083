use crate::error::Error;
use crate::identity::ReplicaIdentity;
use serde::{Deserialize, Serialize};
use shortkey_core::space_size;

/// The half-open integer range `[anchor, limit)` a replica owns within the
/// `36^length` space for one key length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionEpoch {
    pub length: usize,
    pub anchor: u64,
    pub limit: u64,
}

impl PartitionEpoch {
    /// Number of integers in the block.
    pub fn len(&self) -> u64 {
        self.limit - self.anchor
    }

    /// A block is empty when there are more replicas than keys of this length.
    pub fn is_empty(&self) -> bool {
        self.anchor == self.limit
    }

    pub fn contains(&self, value: u64) -> bool {
        self.anchor <= value && value < self.limit
    }
}

/// Computes the block owned by `identity` for keys of `length` symbols.
///
/// Every replica gets `36^length / count` integers starting at
/// `block * index`. The last replica also takes the remainder, so the blocks
/// of all replicas tile `[0, 36^length)` with no gap and no overlap. The
/// result depends only on `(index, count, length)`, never on peers.
pub fn compute_epoch(identity: ReplicaIdentity, length: usize) -> Result<PartitionEpoch, Error> {
    let space = space_size(length).ok_or(Error::SpaceOverflow(length))?;
    let block = space / identity.count();
    let anchor = block * identity.index();
    let limit = if identity.is_last() {
        space
    } else {
        anchor + block
    };

    Ok(PartitionEpoch {
        length,
        anchor,
        limit,
    })
}
