mod allocator;
pub mod error;
mod identity;
mod partition;
mod recycle;
mod snapshot;

pub use allocator::{
    Allocator, AllocatorSettings, Release, DEFAULT_INITIAL_LENGTH, MIN_INITIAL_LENGTH,
};
pub use error::Error;
pub use identity::ReplicaIdentity;
pub use partition::{compute_epoch, PartitionEpoch};
pub use recycle::RecyclePool;
pub use snapshot::AllocatorSnapshot;
