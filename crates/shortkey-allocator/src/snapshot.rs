//! Point-in-time copy of an allocator's state.
//!
//! Without it a restart forgets the cursor, the grown key length and every
//! released key, and a replica would mint keys it already handed out.
//! The snapshot holds exactly what is needed to resume: the identity it was
//! taken under, the current length, the cursor and the recycle pool.

use crate::{
    allocator::{Allocator, AllocatorSettings, AllocatorState},
    error::Error,
    identity::ReplicaIdentity,
    partition::compute_epoch,
    recycle::RecyclePool,
};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use shortkey_core::{Key, MAX_LENGTH};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocatorSnapshot {
    pub identity: ReplicaIdentity,
    pub length: usize,
    pub cursor: u64,
    /// Released keys, sorted so that snapshots of equal state are equal.
    pub recycled: Vec<Key>,
    pub taken_at: Timestamp,
}

impl Allocator {
    /// Captures the current state under the allocator lock.
    pub fn snapshot(&self) -> AllocatorSnapshot {
        let state = self.state.lock();
        let mut recycled: Vec<Key> = state.recycled.iter().cloned().collect();
        recycled.sort();

        AllocatorSnapshot {
            identity: self.identity(),
            length: state.epoch.length,
            cursor: state.cursor,
            recycled,
            taken_at: Timestamp::now(),
        }
    }

    /// Rebuilds an allocator from a snapshot taken by the same replica.
    ///
    /// The snapshot must match the configured identity; restoring under a
    /// different replica count would break the partitioning.
    pub fn restore(settings: AllocatorSettings, snapshot: AllocatorSnapshot) -> Result<Self, Error> {
        settings.validate()?;

        if snapshot.identity != settings.identity {
            return Err(Error::IdentityMismatch {
                expected: settings.identity,
                found: snapshot.identity,
            });
        }

        if snapshot.length < settings.initial_length || snapshot.length > MAX_LENGTH {
            return Err(Error::CorruptSnapshot(format!(
                "length {} is outside {}..={}",
                snapshot.length, settings.initial_length, MAX_LENGTH
            )));
        }

        let epoch = compute_epoch(settings.identity, snapshot.length)?;
        if snapshot.cursor < epoch.anchor || snapshot.cursor > epoch.limit {
            return Err(Error::CorruptSnapshot(format!(
                "cursor {} is outside [{}, {}]",
                snapshot.cursor, epoch.anchor, epoch.limit
            )));
        }

        let recycled_len = snapshot.recycled.len();
        let allocator = Self::from_parts(
            settings,
            AllocatorState {
                epoch,
                cursor: snapshot.cursor,
                recycled: RecyclePool::new(),
            },
        );

        {
            let mut state = allocator.state.lock();
            for key in snapshot.recycled {
                if !allocator.was_issued(&state, &key) {
                    return Err(Error::CorruptSnapshot(format!(
                        "recycled key '{}' was never issued by {}",
                        key, settings.identity
                    )));
                }
                if !state.recycled.release(key.clone()) {
                    return Err(Error::CorruptSnapshot(format!(
                        "recycled key '{}' appears twice",
                        key
                    )));
                }
            }
        }

        info!(
            identity = %settings.identity,
            length = epoch.length,
            cursor = snapshot.cursor,
            recycled = recycled_len,
            taken_at = %snapshot.taken_at,
            "key allocator restored from snapshot"
        );

        Ok(allocator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(index: u64, count: u64) -> AllocatorSettings {
        AllocatorSettings::builder()
            .identity(ReplicaIdentity::new(index, count).unwrap())
            .build()
    }

    fn key(s: &str) -> Key {
        Key::parse(s).unwrap()
    }

    #[test]
    fn restore_resumes_where_snapshot_left_off() {
        let allocator = Allocator::new(settings(1, 2)).unwrap();
        let minted: Vec<Key> = (0..5).map(|_| allocator.allocate()).collect();
        allocator.release(&minted[1]);

        let snapshot = allocator.snapshot();
        let restored = Allocator::restore(settings(1, 2), snapshot).unwrap();

        assert_eq!(restored.cursor(), allocator.cursor());
        assert_eq!(restored.allocate(), minted[1]);
        assert_eq!(allocator.allocate(), minted[1]);
        assert_eq!(restored.allocate(), allocator.allocate());
    }

    #[test]
    fn restore_keeps_grown_length() {
        let allocator = Allocator::new(settings(0, 1)).unwrap();
        for _ in 0..1300 {
            allocator.allocate();
        }

        let restored = Allocator::restore(settings(0, 1), allocator.snapshot()).unwrap();
        assert_eq!(restored.length(), 3);
        assert_eq!(restored.allocate(), allocator.allocate());
    }

    #[test]
    fn snapshot_survives_json() {
        let allocator = Allocator::new(settings(0, 3)).unwrap();
        let k = allocator.allocate();
        allocator.allocate();
        allocator.release(&k);

        let snapshot = allocator.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: AllocatorSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, snapshot);
        assert_eq!(decoded.recycled, vec![k]);
    }

    #[test]
    fn rejects_other_identity() {
        let allocator = Allocator::new(settings(0, 2)).unwrap();
        let err = Allocator::restore(settings(1, 2), allocator.snapshot()).unwrap_err();
        assert!(matches!(err, Error::IdentityMismatch { .. }));
    }

    #[test]
    fn rejects_cursor_outside_epoch() {
        let allocator = Allocator::new(settings(1, 4)).unwrap();
        let mut snapshot = allocator.snapshot();
        snapshot.cursor = 0;
        assert!(matches!(
            Allocator::restore(settings(1, 4), snapshot),
            Err(Error::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn rejects_unissued_recycled_key() {
        let allocator = Allocator::new(settings(0, 1)).unwrap();
        allocator.allocate();
        let mut snapshot = allocator.snapshot();
        snapshot.recycled.push(key("zz"));
        assert!(matches!(
            Allocator::restore(settings(0, 1), snapshot),
            Err(Error::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn rejects_duplicate_recycled_key() {
        let allocator = Allocator::new(settings(0, 1)).unwrap();
        let k = allocator.allocate();
        allocator.release(&k);
        let mut snapshot = allocator.snapshot();
        snapshot.recycled.push(k);
        assert!(matches!(
            Allocator::restore(settings(0, 1), snapshot),
            Err(Error::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn rejects_length_below_initial() {
        let allocator = Allocator::new(settings(0, 1)).unwrap();
        let mut snapshot = allocator.snapshot();
        snapshot.length = 1;
        snapshot.cursor = 0;
        assert!(matches!(
            Allocator::restore(settings(0, 1), snapshot),
            Err(Error::CorruptSnapshot(_))
        ));
    }
}
