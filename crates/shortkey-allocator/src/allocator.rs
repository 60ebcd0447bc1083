use crate::{
    error::Error,
    identity::ReplicaIdentity,
    partition::{compute_epoch, PartitionEpoch},
    recycle::RecyclePool,
};
use parking_lot::Mutex;
use shortkey_core::{encode, Key, MAX_LENGTH};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

/// Shortest key length an allocator may start from.
pub const MIN_INITIAL_LENGTH: usize = 2;
pub const DEFAULT_INITIAL_LENGTH: usize = 2;

/// Configures an [`Allocator`] instance.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct AllocatorSettings {
    /// This replica's ordinal and the total replica count.
    pub identity: ReplicaIdentity,
    /// Key length used for the first block, in `[2, 12]`.
    #[builder(default = DEFAULT_INITIAL_LENGTH)]
    pub initial_length: usize,
}

impl AllocatorSettings {
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if !(MIN_INITIAL_LENGTH..=MAX_LENGTH).contains(&self.initial_length) {
            return Err(Error::InvalidLength {
                length: self.initial_length,
                min: MIN_INITIAL_LENGTH,
                max: MAX_LENGTH,
            });
        }
        Ok(())
    }
}

/// What happened to a key passed to [`Allocator::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// The key is now available for reuse.
    Recycled,
    /// The key was already waiting in the recycle pool.
    AlreadyReleased,
    /// This replica never minted the key, so it is not ours to recycle.
    NotIssued,
}

impl Release {
    pub fn is_recycled(&self) -> bool {
        matches!(self, Release::Recycled)
    }
}

#[derive(Debug)]
pub(crate) struct AllocatorState {
    pub(crate) epoch: PartitionEpoch,
    /// Next unissued integer; always within `[epoch.anchor, epoch.limit]`.
    pub(crate) cursor: u64,
    pub(crate) recycled: RecyclePool,
}

/// Mints cluster-unique short keys without talking to other replicas.
///
/// Each replica owns a fixed block of the key space for every key length
/// (see [`compute_epoch`]). Keys are handed out in this order:
/// 1. any released key from the recycle pool,
/// 2. the next integer of the current block,
/// 3. once the block is used up, the bottom of this replica's block for a
///    key one symbol longer.
///
/// All state sits behind one lock that is held only for in-memory work.
#[derive(Debug)]
pub struct Allocator {
    identity: ReplicaIdentity,
    initial_length: usize,
    pub(crate) state: Mutex<AllocatorState>,
}

impl Allocator {
    /// Creates an allocator positioned at the bottom of its first block.
    pub fn new(settings: AllocatorSettings) -> Result<Self, Error> {
        settings.validate()?;
        let epoch = compute_epoch(settings.identity, settings.initial_length)?;

        info!(
            identity = %settings.identity,
            length = epoch.length,
            anchor = epoch.anchor,
            limit = epoch.limit,
            "key allocator initialized"
        );

        Ok(Self::from_parts(
            settings,
            AllocatorState {
                epoch,
                cursor: epoch.anchor,
                recycled: RecyclePool::new(),
            },
        ))
    }

    pub(crate) fn from_parts(settings: AllocatorSettings, state: AllocatorState) -> Self {
        Self {
            identity: settings.identity,
            initial_length: settings.initial_length,
            state: Mutex::new(state),
        }
    }

    /// Hands out a key that no other live resource in the cluster holds.
    ///
    /// Released keys are always preferred over fresh ones.
    ///
    /// # Panics
    ///
    /// Panics if this replica has used up its block at the longest key
    /// length (`36^12` keys cluster-wide). That volume is far beyond any
    /// realistic load and is treated as unreachable.
    pub fn allocate(&self) -> Key {
        let mut state = self.state.lock();

        if let Some(key) = state.recycled.try_take() {
            debug!(key = %key, "reusing released key");
            return key;
        }

        // A block can be empty when there are more replicas than keys of
        // that length, so keep growing until there is room.
        while state.cursor == state.epoch.limit {
            self.expand(&mut state);
        }

        let key = encode(state.cursor, state.epoch.length)
            .expect("cursor always stays inside the current epoch");
        state.cursor += 1;

        debug!(key = %key, cursor = state.cursor, "minted key");
        key
    }

    /// Returns a key to the pool after its resource has been deleted.
    ///
    /// Never fails: keys this replica did not mint, and keys that are
    /// already pooled, are logged and ignored.
    pub fn release(&self, key: &Key) -> Release {
        let mut state = self.state.lock();

        if !self.was_issued(&state, key) {
            warn!(key = %key, identity = %self.identity, "ignoring release of key this replica never issued");
            return Release::NotIssued;
        }

        if !state.recycled.release(key.clone()) {
            warn!(key = %key, "key was already released");
            return Release::AlreadyReleased;
        }

        debug!(key = %key, pooled = state.recycled.len(), "released key");
        Release::Recycled
    }

    pub fn identity(&self) -> ReplicaIdentity {
        self.identity
    }

    pub fn initial_length(&self) -> usize {
        self.initial_length
    }

    /// Current key length.
    pub fn length(&self) -> usize {
        self.state.lock().epoch.length
    }

    pub fn epoch(&self) -> PartitionEpoch {
        self.state.lock().epoch
    }

    pub fn cursor(&self) -> u64 {
        self.state.lock().cursor
    }

    /// Number of released keys waiting for reuse.
    pub fn recycled_len(&self) -> usize {
        self.state.lock().recycled.len()
    }

    fn expand(&self, state: &mut AllocatorState) {
        let length = state.epoch.length + 1;
        let epoch = compute_epoch(self.identity, length)
            .expect("key space exhausted at the maximum key length");

        info!(
            identity = %self.identity,
            length,
            anchor = epoch.anchor,
            limit = epoch.limit,
            "block exhausted, expanding key length"
        );

        state.epoch = epoch;
        state.cursor = epoch.anchor;
    }

    /// Whether this replica has minted `key` at some point.
    ///
    /// Blocks of shorter lengths were fully consumed before the allocator
    /// grew, so any key inside them was issued. In the current block only
    /// keys below the cursor were.
    pub(crate) fn was_issued(&self, state: &AllocatorState, key: &Key) -> bool {
        let length = key.len();
        let current = state.epoch.length;
        if length < self.initial_length || length > current {
            return false;
        }

        let value = key.value();
        if length == current {
            return state.epoch.anchor <= value && value < state.cursor;
        }

        compute_epoch(self.identity, length).is_ok_and(|epoch| epoch.contains(value))
    }
}
